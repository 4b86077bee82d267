// crates/build-relay-cli/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fixtures for build-relay-cli integration tests.
// Purpose: Build configured routers over in-memory sinks and a fake build service.
// Dependencies: build-relay-cli, build-relay-config, build-relay-core,
// build-relay-trigger, tempfile
// ============================================================================

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

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use build_relay_cli::app::build_router_with_trigger;
use build_relay_config::RelayConfig;
use build_relay_core::CommandRouter;
use build_relay_core::MemoryLogSink;
use build_relay_core::MemoryTransport;
use build_relay_trigger::BuildService;
use build_relay_trigger::BuildTrigger;
use build_relay_trigger::BuildTriggerRequest;
use build_relay_trigger::TriggerError;
use tempfile::TempDir;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Returns config text whose paths live under `root`.
pub fn config_text(root: &Path, prepare: &str) -> String {
    format!(
        r##"
[build_service]
base_url = "http://127.0.0.1:9"

[chat]
default_channel = "builds"

[paths]
cache_root = '{cache}'
sandbox_root = '{sandboxes}'

[process]
timeout_secs = 30

[projects.webapp]
pipeline = "webapp-main"
inform_channel = "#webapp-builds"
default_ref = "refs/heads/main"
{prepare}

[projects.api]
pipeline = "api-main"
"##,
        cache = root.join("cache").display(),
        sandboxes = root.join("sandboxes").display(),
    )
}

// ============================================================================
// SECTION: Fake Build Service
// ============================================================================

/// Build service that records requests and optionally fails.
#[derive(Default)]
pub struct RecordingService {
    /// Requests received.
    pub requests: Mutex<Vec<BuildTriggerRequest>>,
    /// Error returned for every request, when set.
    pub failure: Option<TriggerError>,
}

impl BuildService for RecordingService {
    fn start(&self, request: &BuildTriggerRequest) -> Result<(), TriggerError> {
        self.requests.lock().unwrap().push(request.clone());
        self.failure.clone().map_or(Ok(()), Err)
    }
}

// ============================================================================
// SECTION: Fixture
// ============================================================================

/// Router wired to memory sinks and a recording build service.
pub struct Fixture {
    /// Router with built-ins registered.
    pub router: CommandRouter,
    /// Captured broadcasts.
    pub transport: Arc<MemoryTransport>,
    /// Captured log records.
    pub log: Arc<MemoryLogSink>,
    /// Fake build service.
    pub service: Arc<RecordingService>,
    /// Temp directory holding sandboxes and cache.
    pub dir: TempDir,
}

/// Builds a fixture with real builds enabled.
pub fn fixture(prepare: &str, failure: Option<TriggerError>) -> Fixture {
    fixture_with(prepare, failure, true)
}

/// Builds a fixture, choosing real or simulated builds.
pub fn fixture_with(prepare: &str, failure: Option<TriggerError>, real_builds: bool) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(RelayConfig::from_toml_str(&config_text(dir.path(), prepare)).unwrap());
    let service = Arc::new(RecordingService {
        requests: Mutex::new(Vec::new()),
        failure,
    });
    let trigger = BuildTrigger::new(service.clone(), real_builds, "build-relay");
    let transport = Arc::new(MemoryTransport::with_names(&["builds", "webapp-builds"]));
    let log = Arc::new(MemoryLogSink::new());
    let router = build_router_with_trigger(&config, transport.clone(), log.clone(), trigger);
    Fixture {
        router,
        transport,
        log,
        service,
        dir,
    }
}
