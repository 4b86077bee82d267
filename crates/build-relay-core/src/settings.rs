// crates/build-relay-core/src/settings.rs
// ============================================================================
// Module: Engine Settings
// Description: Read-only settings and project catalog consumed by the engine.
// Purpose: Decouple the dispatch engine from the configuration file format.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The engine needs only a handful of settings (default channel, debug
//! delivery flag, sandbox root) and the set of known projects with their
//! optional inform channels. Loading and validating them is the job of the
//! configuration crate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Settings consumed by the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Process-wide default notification channel.
    pub default_channel: Option<String>,
    /// Deliver `debug` output to direct replies when set.
    pub debug_private_messages: bool,
    /// Base directory for invocation sandboxes.
    pub sandbox_root: PathBuf,
}

impl EngineSettings {
    /// Creates settings with no default channel and debug delivery disabled.
    #[must_use]
    pub fn new(sandbox_root: impl Into<PathBuf>) -> Self {
        Self {
            default_channel: None,
            debug_private_messages: false,
            sandbox_root: sandbox_root.into(),
        }
    }
}

// ============================================================================
// SECTION: Projects
// ============================================================================

/// Project entry as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Project name used as the `PROJECT` command token.
    pub name: String,
    /// Channel announcements for this project go to.
    pub inform_channel: Option<String>,
}

impl Project {
    /// Creates a project without an inform channel.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inform_channel: None,
        }
    }

    /// Sets the inform channel.
    #[must_use]
    pub fn with_inform_channel(mut self, channel: impl Into<String>) -> Self {
        self.inform_channel = Some(channel.into());
        self
    }
}

/// Known projects keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectCatalog {
    /// Projects keyed by name.
    projects: BTreeMap<String, Project>,
}

impl ProjectCatalog {
    /// Builds a catalog from project entries; later duplicates win.
    #[must_use]
    pub fn new(projects: impl IntoIterator<Item = Project>) -> Self {
        Self {
            projects: projects.into_iter().map(|project| (project.name.clone(), project)).collect(),
        }
    }

    /// Looks up a project by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Project> {
        self.projects.get(name)
    }

    /// Returns all project names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.projects.keys().map(String::as_str).collect()
    }

    /// Returns the number of projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Returns true when no projects are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
