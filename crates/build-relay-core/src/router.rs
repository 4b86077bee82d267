// crates/build-relay-core/src/router.rs
// ============================================================================
// Module: Command Router
// Description: Command registry, argument validation, and the dispatch boundary.
// Purpose: Turn inbound text and events into isolated, fully reported invocations.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`CommandRouter`] resolves the first token of inbound text to a registered
//! [`CommandDefinition`], validates the project token and argument count, runs
//! the handler, and then applies the two-tier boundary policy:
//! - completed or already-reported: log the sandbox path (reported only) and
//!   remove the sandbox;
//! - unhandled (including a handler panic): report the input, failure text,
//!   and diagnostic trace through the error path and keep the sandbox.
//!
//! Events follow the same boundary without argument validation.
//! Invariants:
//! - Text that matches no command allocates no invocation id.
//! - Handler logic only runs after project and argument validation pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::command::CommandDefinition;
use crate::command::CommandHandler;
use crate::command::EventHandler;
use crate::command::HelpSpec;
use crate::context::HttpResponse;
use crate::context::InvocationContext;
use crate::context::Origin;
use crate::error::InvocationError;
use crate::error::InvocationOutcome;
use crate::identity::InvocationId;
use crate::log::LogLevel;
use crate::panics;
use crate::panics::CaughtPanic;
use crate::services::EngineServices;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// HTTP status for validation failures.
pub const STATUS_BAD_REQUEST: u16 = 400;
/// HTTP status for unhandled failures.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Result of one invocation, as returned to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationReport {
    /// Invocation id.
    pub id: InvocationId,
    /// Command name or event title.
    pub handler_name: String,
    /// How the invocation ended.
    pub outcome: InvocationOutcome,
    /// Bound HTTP response, when the origin was HTTP.
    pub http_response: Option<HttpResponse>,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for a [`CommandRouter`].
///
/// # Invariants
/// - Registering a name or title twice keeps the later registration.
pub struct CommandRouterBuilder {
    /// Shared engine services.
    services: Arc<EngineServices>,
    /// Commands keyed by lowercase name.
    commands: BTreeMap<String, CommandDefinition>,
    /// Event handlers keyed by title.
    events: BTreeMap<String, Arc<dyn EventHandler>>,
}

impl CommandRouterBuilder {
    /// Registers a command.
    #[must_use]
    pub fn register(
        mut self,
        name: &str,
        help: impl Into<HelpSpec>,
        max_args: usize,
        handler: impl CommandHandler + 'static,
    ) -> Self {
        let definition = CommandDefinition::new(name, help, max_args, Arc::new(handler));
        self.commands.insert(definition.name().to_string(), definition);
        self
    }

    /// Registers an event handler for `title`.
    #[must_use]
    pub fn event(mut self, title: impl Into<String>, handler: impl EventHandler + 'static) -> Self {
        self.events.insert(title.into(), Arc::new(handler));
        self
    }

    /// Builds the router.
    #[must_use]
    pub fn build(self) -> CommandRouter {
        CommandRouter {
            services: self.services,
            commands: self.commands,
            events: self.events,
        }
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Command registry and dispatch boundary.
pub struct CommandRouter {
    /// Shared engine services.
    services: Arc<EngineServices>,
    /// Commands keyed by lowercase name.
    commands: BTreeMap<String, CommandDefinition>,
    /// Event handlers keyed by title.
    events: BTreeMap<String, Arc<dyn EventHandler>>,
}

impl CommandRouter {
    /// Returns a builder bound to `services`.
    #[must_use]
    pub fn builder(services: Arc<EngineServices>) -> CommandRouterBuilder {
        CommandRouterBuilder {
            services,
            commands: BTreeMap::new(),
            events: BTreeMap::new(),
        }
    }

    /// Returns the shared engine services.
    #[must_use]
    pub fn services(&self) -> &Arc<EngineServices> {
        &self.services
    }

    /// Looks up a command by name, ignoring case.
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.commands.get(&name.to_ascii_lowercase())
    }

    /// Returns usage text for every registered command.
    #[must_use]
    pub fn usage(&self) -> String {
        self.commands.values().map(CommandDefinition::usage).collect::<Vec<_>>().join("\n")
    }

    /// Returns true when the first token of `text` names a command.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        text.split_whitespace().next().is_some_and(|name| self.command(name).is_some())
    }

    /// Dispatches inbound command text.
    ///
    /// Returns `None` when the text does not name a registered command.
    pub fn dispatch(&self, text: &str, origin: Origin) -> Option<InvocationReport> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let definition = self.command(tokens.first()?)?;
        let mut ctx = InvocationContext::new(Arc::clone(&self.services), definition.name(), origin);
        ctx.log(LogLevel::Debug, &format!("invocation {} received: {text}", ctx.id()));
        let result = panics::catch(|| {
            let args = self.validate(&mut ctx, definition, &tokens)?;
            definition.handler().execute(&mut ctx, &args)
        });
        Some(self.finish(ctx, text.trim(), result))
    }

    /// Dispatches an inbound event to the handler registered for `title`.
    pub fn handle_event(&self, title: &str, body: &str, origin: Origin) -> InvocationReport {
        let mut ctx =
            InvocationContext::new(Arc::clone(&self.services), title, origin.without_reply());
        ctx.log(LogLevel::Debug, &format!("invocation {} received event", ctx.id()));
        let handler = self.events.get(title).cloned();
        let result = panics::catch(|| match handler {
            Some(handler) => handler.handle(&mut ctx, body),
            None => Err(InvocationError::unhandled(format!("no handler registered for event '{title}'"))),
        });
        self.finish(ctx, &format!("event {title}"), result)
    }

    /// Validates the project token and argument count.
    fn validate(
        &self,
        ctx: &mut InvocationContext,
        definition: &CommandDefinition,
        tokens: &[&str],
    ) -> Result<Vec<String>, InvocationError> {
        let usage = definition.usage();
        let Some(project) = tokens.get(1) else {
            return Err(ctx.fail(
                format!("Missing project for '{}'.\nUsage:\n{usage}", definition.name()),
                STATUS_BAD_REQUEST,
            ));
        };
        ctx.set_project_name(*project);
        if ctx.project().is_none() {
            let known = self.services.projects().names().join(", ");
            return Err(ctx.fail(
                format!("Unknown project '{project}'. Known projects: {known}\nUsage:\n{usage}"),
                STATUS_BAD_REQUEST,
            ));
        }
        let args: Vec<String> = tokens.iter().skip(2).map(|token| (*token).to_string()).collect();
        if args.len() > definition.max_args() {
            return Err(ctx.fail(
                format!(
                    "Wrong number of arguments ({} for {})\nUsage:\n{usage}",
                    args.len() + 1,
                    definition.max_args() + 1
                ),
                STATUS_BAD_REQUEST,
            ));
        }
        Ok(args)
    }

    /// Applies the boundary policy to a finished handler run.
    fn finish(
        &self,
        mut ctx: InvocationContext,
        input: &str,
        result: Result<Result<(), InvocationError>, CaughtPanic>,
    ) -> InvocationReport {
        let outcome = match result {
            Ok(Ok(())) => {
                self.cleanup(&ctx);
                InvocationOutcome::Completed
            }
            Ok(Err(InvocationError::Reported {
                message,
            })) => {
                ctx.debug(&format!("sandbox: {}", ctx.sandbox_path().display()));
                self.cleanup(&ctx);
                InvocationOutcome::Recovered {
                    message,
                }
            }
            Ok(Err(err)) => Self::report_unhandled(&mut ctx, input, &err.diagnostic()),
            Err(panic) => Self::report_unhandled(
                &mut ctx,
                input,
                &format!("handler panicked: {}", panic.diagnostic()),
            ),
        };
        InvocationReport {
            id: ctx.id(),
            handler_name: ctx.handler_name().to_string(),
            outcome,
            http_response: ctx.into_http_response(),
        }
    }

    /// Reports an unhandled failure and preserves the sandbox.
    fn report_unhandled(
        ctx: &mut InvocationContext,
        input: &str,
        diagnostic: &str,
    ) -> InvocationOutcome {
        let report = format!("Error while handling \"{input}\": {diagnostic}");
        ctx.error(&report, STATUS_INTERNAL_ERROR);
        let sandbox = ctx.sandbox_path();
        ctx.debug(&format!("sandbox preserved: {}", sandbox.display()));
        InvocationOutcome::Unhandled {
            report,
            sandbox,
        }
    }

    /// Removes the sandbox, logging removal failures.
    fn cleanup(&self, ctx: &InvocationContext) {
        if let Err(err) = self.services.sandboxes().cleanup(ctx.id()) {
            ctx.log(LogLevel::Error, &err.to_string());
        }
    }
}
