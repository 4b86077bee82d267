// crates/build-relay-config/src/lib.rs
// ============================================================================
// Module: Build Relay Config Library
// Description: Configuration model and loader for Build Relay.
// Purpose: Parse, validate, and convert the relay's TOML configuration.
// Dependencies: build-relay-core, build-relay-trigger, serde, toml
// ============================================================================

//! ## Overview
//! [`RelayConfig`] is the single configuration file of the relay. It is
//! loaded with strict size and path limits, validated fail-closed, and then
//! converted into the engine's settings and project catalog, the build
//! service configuration, and the process runner.

pub mod config;

pub use config::BuildServiceSection;
pub use config::CACHE_ROOT_ENV_VAR;
pub use config::CONFIG_ENV_VAR;
pub use config::ChatConfig;
pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_NAME;
pub use config::PathsConfig;
pub use config::ProcessConfig;
pub use config::ProjectConfig;
pub use config::RelayConfig;
