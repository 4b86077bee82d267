// crates/build-relay-cli/src/lib.rs
// ============================================================================
// Module: Build Relay CLI Library
// Description: Built-in commands, transports, and the HTTP front end.
// Purpose: Wire configuration, engine, and trigger into a runnable relay.
// Dependencies: build-relay-config, build-relay-core, build-relay-trigger,
// serde_json, tiny_http, tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) parses arguments and delegates to
//! this library: [`app::build_router`] assembles a router from a
//! [`build_relay_config::RelayConfig`], [`console`] runs the interactive
//! loop, and [`server`] exposes the router over HTTP.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod app;
pub mod commands;
pub mod console;
pub mod logging;
pub mod server;
