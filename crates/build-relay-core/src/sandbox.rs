// crates/build-relay-core/src/sandbox.rs
// ============================================================================
// Module: Invocation Sandboxes
// Description: Per-invocation scratch directories under a shared root.
// Purpose: Give each invocation an isolated, initially empty working directory.
// Dependencies: thiserror, std
// ============================================================================

//! ## Overview
//! [`SandboxManager`] maps an [`InvocationId`] to `root/<id>`. Preparing a
//! sandbox wipes whatever a previous process left at that path and creates the
//! directory fresh; cleanup removes it recursively. The invocation context
//! memoizes the prepared path, so preparation runs at most once per invocation.
//! Invariants:
//! - Sandbox paths are namespaced by invocation id and never shared.
//! - A freshly prepared sandbox is empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

use crate::identity::InvocationId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while preparing or removing sandboxes.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Stale contents at the sandbox path could not be removed.
    #[error("failed to clear stale sandbox {path}: {source}")]
    Clear {
        /// Sandbox path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The sandbox directory could not be created.
    #[error("failed to create sandbox {path}: {source}")]
    Create {
        /// Sandbox path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The sandbox directory could not be removed.
    #[error("failed to remove sandbox {path}: {source}")]
    Remove {
        /// Sandbox path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// SECTION: Manager
// ============================================================================

/// Creates and destroys invocation sandboxes under a base root.
#[derive(Debug, Clone)]
pub struct SandboxManager {
    /// Base directory holding one subdirectory per invocation.
    root: PathBuf,
}

impl SandboxManager {
    /// Creates a manager rooted at `root`. The root is created lazily.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Returns the base root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the sandbox path for `id` without touching the filesystem.
    #[must_use]
    pub fn path_for(&self, id: InvocationId) -> PathBuf {
        self.root.join(id.to_string())
    }

    /// Clears any stale contents for `id` and creates an empty directory.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError`] when the stale tree cannot be removed or the
    /// directory cannot be created.
    pub fn prepare(&self, id: InvocationId) -> Result<PathBuf, SandboxError> {
        let path = self.path_for(id);
        remove_tree(&path).map_err(|source| SandboxError::Clear {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&path).map_err(|source| SandboxError::Create {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Removes the sandbox for `id`. A missing directory is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::Remove`] when removal fails.
    pub fn cleanup(&self, id: InvocationId) -> Result<(), SandboxError> {
        let path = self.path_for(id);
        remove_tree(&path).map_err(|source| SandboxError::Remove {
            path,
            source,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Recursively removes `path`, treating absence as success.
fn remove_tree(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
