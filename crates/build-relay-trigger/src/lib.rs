// crates/build-relay-trigger/src/lib.rs
// ============================================================================
// Module: Build Relay Trigger Library
// Description: Starts build-service pipelines on behalf of invocations.
// Purpose: Provide the dry-run aware build trigger and its HTTP client.
// Dependencies: build-relay-core, reqwest, thiserror, url
// ============================================================================

//! ## Overview
//! [`BuildTrigger`] is the invocation-facing entry point. It either simulates
//! a build (dry run) or asks a [`BuildService`] to start one, and reports
//! failures through the invocation's error path. [`HttpBuildService`] is the
//! production service: an authenticated form POST to
//! `{base_url}/job/{pipeline}/buildWithParameters`.

pub mod client;
pub mod config;
pub mod trigger;

pub use client::BuildService;
pub use client::HttpBuildService;
pub use config::BuildServiceConfig;
pub use config::DEFAULT_BASE_URL;
pub use config::DEFAULT_INITIATOR;
pub use config::DEFAULT_TIMEOUT;
pub use trigger::BuildTrigger;
pub use trigger::BuildTriggerRequest;
pub use trigger::STATUS_BAD_GATEWAY;
pub use trigger::TriggerError;

#[cfg(test)]
mod tests;
