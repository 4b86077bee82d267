// crates/build-relay-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared harness for build-relay-core integration tests.
// Purpose: Build engine services over temp directories and in-memory sinks.
// Dependencies: build-relay-core, tempfile
// ============================================================================

//! ## Overview
//! Provides a [`Harness`] bundling engine services, a memory log sink, a memory
//! transport, and the temp directory holding the sandbox root.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::path::PathBuf;
use std::sync::Arc;

use build_relay_core::EngineServices;
use build_relay_core::EngineSettings;
use build_relay_core::MemoryLogSink;
use build_relay_core::MemoryTransport;
use build_relay_core::Project;
use build_relay_core::ProjectCatalog;
use tempfile::TempDir;

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Engine services wired to in-memory sinks.
pub struct Harness {
    /// Shared services.
    pub services: Arc<EngineServices>,
    /// Captured log records.
    pub log: Arc<MemoryLogSink>,
    /// Captured broadcasts.
    pub transport: Arc<MemoryTransport>,
    /// Temp directory owning the sandbox root.
    pub dir: TempDir,
}

impl Harness {
    /// Returns the sandbox root.
    pub fn sandbox_root(&self) -> PathBuf {
        self.dir.path().join("sandboxes")
    }
}

/// Default projects: `webapp` (with inform channel) and `api` (without).
pub fn sample_projects() -> ProjectCatalog {
    ProjectCatalog::new([
        Project::new("webapp").with_inform_channel("#webapp-builds"),
        Project::new("api"),
    ])
}

/// Builds a harness with default channel `builds` and debug delivery off.
pub fn harness() -> Harness {
    harness_with(|_| {})
}

/// Builds a harness after letting `tweak` adjust the settings.
pub fn harness_with(tweak: impl FnOnce(&mut EngineSettings)) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = EngineSettings::new(dir.path().join("sandboxes"));
    settings.default_channel = Some("builds".to_string());
    tweak(&mut settings);
    let log = Arc::new(MemoryLogSink::new());
    let transport =
        Arc::new(MemoryTransport::with_names(&["builds", "webapp-builds", "random"]));
    let services = EngineServices::builder(settings, sample_projects())
        .transport(transport.clone())
        .log_sink(log.clone())
        .build();
    Harness {
        services,
        log,
        transport,
        dir,
    }
}
