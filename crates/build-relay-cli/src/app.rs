// crates/build-relay-cli/src/app.rs
// ============================================================================
// Module: Relay Assembly
// Description: Builds a ready-to-dispatch router from configuration.
// Purpose: Compose engine services, the build trigger, and built-in commands.
// Dependencies: build-relay-config, build-relay-core, build-relay-trigger
// ============================================================================

use std::sync::Arc;

use build_relay_config::ConfigError;
use build_relay_config::RelayConfig;
use build_relay_core::ChatTransport;
use build_relay_core::CommandRouter;
use build_relay_core::EngineServices;
use build_relay_core::LogSink;
use build_relay_trigger::BuildTrigger;
use build_relay_trigger::TriggerError;
use thiserror::Error;

use crate::commands::register_builtins;

/// Failures while assembling the relay.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Configuration could not be converted.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The build trigger could not be created.
    #[error(transparent)]
    Trigger(#[from] TriggerError),
}

/// Builds engine services for `config` over the given sinks.
#[must_use]
pub fn engine_services(
    config: &RelayConfig,
    transport: Arc<dyn ChatTransport>,
    log: Arc<dyn LogSink>,
) -> Arc<EngineServices> {
    EngineServices::builder(config.engine_settings(), config.project_catalog())
        .transport(transport)
        .log_sink(log)
        .process_runner(config.process_runner())
        .build()
}

/// Builds the router with built-ins and an HTTP-backed trigger.
///
/// # Errors
///
/// Returns [`SetupError`] when the build service settings are unusable.
pub fn build_router(
    config: &Arc<RelayConfig>,
    transport: Arc<dyn ChatTransport>,
    log: Arc<dyn LogSink>,
) -> Result<CommandRouter, SetupError> {
    let trigger = BuildTrigger::from_config(&config.build_service_config()?)?;
    Ok(build_router_with_trigger(config, transport, log, trigger))
}

/// Builds the router with built-ins around an explicit trigger.
#[must_use]
pub fn build_router_with_trigger(
    config: &Arc<RelayConfig>,
    transport: Arc<dyn ChatTransport>,
    log: Arc<dyn LogSink>,
    trigger: BuildTrigger,
) -> CommandRouter {
    let services = engine_services(config, transport, log);
    register_builtins(CommandRouter::builder(services), config, trigger).build()
}
