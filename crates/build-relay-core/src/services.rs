// crates/build-relay-core/src/services.rs
// ============================================================================
// Module: Engine Services
// Description: Shared collaborators injected into every invocation.
// Purpose: Bundle settings, id allocation, sandboxes, transport, and logging.
// Dependencies: std
// ============================================================================

//! ## Overview
//! [`EngineServices`] is built once at startup and shared by reference count
//! across routers and threads. Apart from the identity allocator, everything in
//! it is read-only after construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::identity::IdentityAllocator;
use crate::log::LogSink;
use crate::log::TracingLogSink;
use crate::process::ProcessRunner;
use crate::sandbox::SandboxManager;
use crate::settings::EngineSettings;
use crate::settings::ProjectCatalog;
use crate::transport::ChatTransport;
use crate::transport::NullTransport;

// ============================================================================
// SECTION: Services
// ============================================================================

/// Collaborators shared by all invocations.
pub struct EngineServices {
    /// Engine settings.
    settings: EngineSettings,
    /// Known projects.
    projects: ProjectCatalog,
    /// Shared invocation id allocator.
    allocator: IdentityAllocator,
    /// Sandbox manager rooted at `settings.sandbox_root`.
    sandboxes: SandboxManager,
    /// Chat transport for channel broadcasts.
    transport: Arc<dyn ChatTransport>,
    /// Process log stream.
    log: Arc<dyn LogSink>,
    /// Runner for external processes.
    runner: ProcessRunner,
}

impl EngineServices {
    /// Returns a builder for engine services.
    #[must_use]
    pub fn builder(settings: EngineSettings, projects: ProjectCatalog) -> EngineServicesBuilder {
        EngineServicesBuilder {
            settings,
            projects,
            transport: None,
            log: None,
            runner: None,
        }
    }

    /// Returns the engine settings.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Returns the project catalog.
    #[must_use]
    pub const fn projects(&self) -> &ProjectCatalog {
        &self.projects
    }

    /// Returns the identity allocator.
    #[must_use]
    pub const fn allocator(&self) -> &IdentityAllocator {
        &self.allocator
    }

    /// Returns the sandbox manager.
    #[must_use]
    pub const fn sandboxes(&self) -> &SandboxManager {
        &self.sandboxes
    }

    /// Returns the chat transport.
    #[must_use]
    pub fn transport(&self) -> &dyn ChatTransport {
        self.transport.as_ref()
    }

    /// Returns the log sink.
    #[must_use]
    pub fn log(&self) -> &dyn LogSink {
        self.log.as_ref()
    }

    /// Returns the process runner.
    #[must_use]
    pub const fn runner(&self) -> &ProcessRunner {
        &self.runner
    }
}

/// Builder for [`EngineServices`].
///
/// # Invariants
/// - Unset collaborators fall back to [`NullTransport`], [`TracingLogSink`],
///   and [`ProcessRunner::default`].
pub struct EngineServicesBuilder {
    /// Engine settings.
    settings: EngineSettings,
    /// Known projects.
    projects: ProjectCatalog,
    /// Optional chat transport.
    transport: Option<Arc<dyn ChatTransport>>,
    /// Optional log sink.
    log: Option<Arc<dyn LogSink>>,
    /// Optional process runner.
    runner: Option<ProcessRunner>,
}

impl EngineServicesBuilder {
    /// Sets the chat transport.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn ChatTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the log sink.
    #[must_use]
    pub fn log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    /// Sets the process runner.
    #[must_use]
    pub fn process_runner(mut self, runner: ProcessRunner) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Builds the shared services.
    #[must_use]
    pub fn build(self) -> Arc<EngineServices> {
        let sandboxes = SandboxManager::new(self.settings.sandbox_root.clone());
        Arc::new(EngineServices {
            settings: self.settings,
            projects: self.projects,
            allocator: IdentityAllocator::new(),
            sandboxes,
            transport: self.transport.unwrap_or_else(|| Arc::new(NullTransport)),
            log: self.log.unwrap_or_else(|| Arc::new(TracingLogSink)),
            runner: self.runner.unwrap_or_default(),
        })
    }
}
