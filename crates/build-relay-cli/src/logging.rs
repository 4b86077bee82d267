// crates/build-relay-cli/src/logging.rs
// ============================================================================
// Module: Logging Setup
// Description: Process-wide tracing subscriber installation.
// Purpose: Route engine log records to stderr with `RUST_LOG` filtering.
// Dependencies: tracing-subscriber
// ============================================================================

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the stderr fmt subscriber.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(verbose: bool) -> bool {
    let fallback = if verbose { "debug" } else { DEFAULT_LOG_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
