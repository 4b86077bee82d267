// crates/build-relay-core/src/command.rs
// ============================================================================
// Module: Command Definitions
// Description: Handler contracts and registered command metadata.
// Purpose: Describe commands, their help text, and argument limits.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Commands are registered once as [`CommandDefinition`] values and resolved by
//! name at dispatch time. Handler logic implements [`CommandHandler`] (or is a
//! closure with the same shape); event logic implements [`EventHandler`].
//! Help entries expand to usage lines of the form
//! `NAME PROJECT ARGPATTERN   - DESCRIPTION`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::context::InvocationContext;
use crate::error::InvocationError;

// ============================================================================
// SECTION: Handler Contracts
// ============================================================================

/// Logic executed for a validated command.
pub trait CommandHandler: Send + Sync {
    /// Executes the command with the tokens that follow the project token.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError`] when the command fails.
    fn execute(&self, ctx: &mut InvocationContext, args: &[String])
    -> Result<(), InvocationError>;
}

impl<F> CommandHandler for F
where
    F: Fn(&mut InvocationContext, &[String]) -> Result<(), InvocationError> + Send + Sync,
{
    fn execute(
        &self,
        ctx: &mut InvocationContext,
        args: &[String],
    ) -> Result<(), InvocationError> {
        self(ctx, args)
    }
}

/// Logic executed for an inbound event.
pub trait EventHandler: Send + Sync {
    /// Handles the event body.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError`] when handling fails.
    fn handle(&self, ctx: &mut InvocationContext, body: &str) -> Result<(), InvocationError>;
}

impl<F> EventHandler for F
where
    F: Fn(&mut InvocationContext, &str) -> Result<(), InvocationError> + Send + Sync,
{
    fn handle(&self, ctx: &mut InvocationContext, body: &str) -> Result<(), InvocationError> {
        self(ctx, body)
    }
}

// ============================================================================
// SECTION: Help Text
// ============================================================================

/// Help for a command: one description, or descriptions per argument pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelpSpec {
    /// Description of the bare command.
    Bare(String),
    /// Ordered `(argument pattern, description)` entries.
    Patterns(Vec<(String, String)>),
}

impl HelpSpec {
    /// Builds pattern help from ordered entries.
    #[must_use]
    pub fn patterns<P, D>(entries: impl IntoIterator<Item = (P, D)>) -> Self
    where
        P: Into<String>,
        D: Into<String>,
    {
        Self::Patterns(
            entries.into_iter().map(|(pattern, desc)| (pattern.into(), desc.into())).collect(),
        )
    }

    /// Expands the help into usage lines for `name`.
    #[must_use]
    pub fn usage_lines(&self, name: &str) -> Vec<String> {
        match self {
            Self::Bare(description) => vec![usage_line(name, "", description)],
            Self::Patterns(entries) => entries
                .iter()
                .map(|(pattern, description)| usage_line(name, pattern, description))
                .collect(),
        }
    }
}

impl From<&str> for HelpSpec {
    fn from(description: &str) -> Self {
        Self::Bare(description.to_string())
    }
}

impl From<String> for HelpSpec {
    fn from(description: String) -> Self {
        Self::Bare(description)
    }
}

/// Formats one usage line.
fn usage_line(name: &str, pattern: &str, description: &str) -> String {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        format!("{name} PROJECT   - {description}")
    } else {
        format!("{name} PROJECT {pattern}   - {description}")
    }
}

// ============================================================================
// SECTION: Command Definition
// ============================================================================

/// Registered command.
///
/// # Invariants
/// - Immutable after registration.
#[derive(Clone)]
pub struct CommandDefinition {
    /// Command name (lowercase).
    name: String,
    /// Help text.
    help: HelpSpec,
    /// Maximum number of tokens after the project token.
    max_args: usize,
    /// Handler logic.
    handler: Arc<dyn CommandHandler>,
}

impl CommandDefinition {
    /// Creates a command definition; the name is lowercased.
    #[must_use]
    pub fn new(
        name: &str,
        help: impl Into<HelpSpec>,
        max_args: usize,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            help: help.into(),
            max_args,
            handler,
        }
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the help entries.
    #[must_use]
    pub const fn help(&self) -> &HelpSpec {
        &self.help
    }

    /// Returns the maximum trailing argument count.
    #[must_use]
    pub const fn max_args(&self) -> usize {
        self.max_args
    }

    /// Returns the handler logic.
    #[must_use]
    pub fn handler(&self) -> &dyn CommandHandler {
        self.handler.as_ref()
    }

    /// Returns the usage text, one line per help entry.
    #[must_use]
    pub fn usage(&self) -> String {
        self.help.usage_lines(&self.name).join("\n")
    }
}
