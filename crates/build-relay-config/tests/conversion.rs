//! Config conversion tests for build-relay-config.
// crates/build-relay-config/tests/conversion.rs
// =============================================================================
// Module: Config Conversion Tests
// Description: Validate conversion into engine, trigger, and runner settings.
// Purpose: Ensure configured values reach the components that consume them.
// =============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]

use std::time::Duration;

use build_relay_config::RelayConfig;

const FULL: &str = r##"
[build_service]
base_url = "https://ci.example.com/jenkins"
username = "relay"
api_token = "secret-token"
real_builds = true
timeout_ms = 2500
default_initiator = "chatops"

[chat]
default_channel = "#builds"
debug_private_messages = true

[paths]
cache_root = "/var/cache/build-relay"
sandbox_root = "/tmp/build-relay/sandboxes"

[process]
timeout_secs = 90

[projects.webapp]
pipeline = "webapp-main"
inform_channel = "webapp-builds"
default_ref = "refs/heads/main"
prepare_command = ["make", "check"]

[projects.api]
pipeline = "api-main"
"##;

fn full() -> RelayConfig {
    RelayConfig::from_toml_str(FULL).unwrap()
}

#[test]
fn engine_settings_carry_chat_and_sandbox_values() {
    let settings = full().engine_settings();
    assert_eq!(settings.default_channel.as_deref(), Some("#builds"));
    assert!(settings.debug_private_messages);
    assert_eq!(settings.sandbox_root, std::path::PathBuf::from("/tmp/build-relay/sandboxes"));
}

#[test]
fn project_catalog_preserves_inform_channels() {
    let catalog = full().project_catalog();
    assert_eq!(catalog.names(), vec!["api", "webapp"]);
    assert_eq!(catalog.get("webapp").unwrap().inform_channel.as_deref(), Some("webapp-builds"));
    assert!(catalog.get("api").unwrap().inform_channel.is_none());
}

#[test]
fn build_service_config_carries_connection_values() {
    let config = full().build_service_config().unwrap();
    assert_eq!(config.base_url.as_str(), "https://ci.example.com/jenkins");
    assert_eq!(config.username, "relay");
    assert_eq!(config.api_token, "secret-token");
    assert!(config.real_builds);
    assert_eq!(config.timeout, Duration::from_millis(2500));
    assert_eq!(config.default_initiator, "chatops");
}

#[test]
fn process_runner_uses_configured_timeout() {
    assert_eq!(full().process_runner().timeout(), Duration::from_secs(90));
}

#[test]
fn project_lookup_exposes_build_details() {
    let config = full();
    let webapp = config.project("webapp").unwrap();
    assert_eq!(webapp.pipeline, "webapp-main");
    assert_eq!(webapp.default_ref, "refs/heads/main");
    assert_eq!(
        webapp.prepare_command.as_deref(),
        Some(&["make".to_string(), "check".to_string()][..])
    );
    assert!(config.project("missing").is_none());
}

#[test]
fn debug_output_redacts_api_token() {
    let rendered = format!("{:?}", full().build_service);
    assert!(!rendered.contains("secret-token"));
}
