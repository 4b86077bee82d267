// crates/build-relay-trigger/src/trigger.rs
// ============================================================================
// Module: Build Trigger
// Description: Invocation-facing pipeline trigger with dry-run support.
// Purpose: Start builds and report failures through the invocation.
// Dependencies: build-relay-core, thiserror
// ============================================================================

//! ## Overview
//! [`BuildTrigger::trigger_build`] returns `true` when the build was started
//! or simulated and `false` after reporting a failure with status 502.
//! [`BuildTrigger::start_build`] does the same but returns the reported
//! failure so command handlers can propagate it with `?`.
//! Invariants:
//! - Dry runs never touch the network.
//! - Failures are reported exactly once and never retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use build_relay_core::InvocationContext;
use build_relay_core::InvocationError;
use build_relay_core::LogLevel;
use thiserror::Error;

use crate::client::BuildService;
use crate::client::HttpBuildService;
use crate::config::BuildServiceConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// HTTP status reported when the build service fails.
pub const STATUS_BAD_GATEWAY: u16 = 502;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Build service failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// The HTTP client could not be constructed.
    #[error("build service client error: {0}")]
    Client(String),
    /// The trigger URL could not be built.
    #[error("invalid build service url: {0}")]
    InvalidUrl(String),
    /// No response was received.
    #[error("build service unreachable: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("build service returned http status {0}")]
    Status(u16),
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Parameters of one pipeline start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTriggerRequest {
    /// Pipeline (job) name.
    pub pipeline: String,
    /// Git ref to build.
    pub git_ref: String,
    /// Requesting user or the default label.
    pub initiator: String,
}

// ============================================================================
// SECTION: Trigger
// ============================================================================

/// Starts pipelines for invocations.
#[derive(Clone)]
pub struct BuildTrigger {
    /// Service that starts real builds.
    service: Arc<dyn BuildService>,
    /// Start real builds when set.
    real_builds: bool,
    /// Initiator label for invocations without a requesting user.
    default_initiator: String,
}

impl BuildTrigger {
    /// Creates a trigger around an explicit service.
    #[must_use]
    pub fn new(
        service: Arc<dyn BuildService>,
        real_builds: bool,
        default_initiator: impl Into<String>,
    ) -> Self {
        Self {
            service,
            real_builds,
            default_initiator: default_initiator.into(),
        }
    }

    /// Creates a trigger backed by [`HttpBuildService`].
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::Client`] when the HTTP client cannot be built.
    pub fn from_config(config: &BuildServiceConfig) -> Result<Self, TriggerError> {
        let service = HttpBuildService::new(config)?;
        Ok(Self::new(Arc::new(service), config.real_builds, config.default_initiator.clone()))
    }

    /// Returns true when builds are really started.
    #[must_use]
    pub const fn real_builds(&self) -> bool {
        self.real_builds
    }

    /// Builds the request an invocation would send.
    #[must_use]
    pub fn request_for(
        &self,
        ctx: &InvocationContext,
        pipeline: &str,
        git_ref: &str,
    ) -> BuildTriggerRequest {
        BuildTriggerRequest {
            pipeline: pipeline.to_string(),
            git_ref: git_ref.to_string(),
            initiator: ctx.initiator().unwrap_or(&self.default_initiator).to_string(),
        }
    }

    /// Starts `pipeline` at `git_ref`, or simulates it in dry-run mode.
    ///
    /// Returns `false` after reporting the failure through `ctx`.
    pub fn trigger_build(&self, ctx: &mut InvocationContext, pipeline: &str, git_ref: &str) -> bool {
        self.start_build(ctx, pipeline, git_ref).is_ok()
    }

    /// Like [`BuildTrigger::trigger_build`], but yields the delivered failure.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Reported`] carrying the message already sent
    /// with status 502.
    pub fn start_build(
        &self,
        ctx: &mut InvocationContext,
        pipeline: &str,
        git_ref: &str,
    ) -> Result<(), InvocationError> {
        let request = self.request_for(ctx, pipeline, git_ref);
        if !self.real_builds {
            ctx.warn(&format!(
                "Dry run: would trigger {} at {} for {}",
                request.pipeline, request.git_ref, request.initiator
            ));
            return Ok(());
        }
        self.service.start(&request).map_err(|err| {
            ctx.fail(
                format!("Failed to trigger {} at {}: {err}", request.pipeline, request.git_ref),
                STATUS_BAD_GATEWAY,
            )
        })?;
        ctx.log(LogLevel::Info, &format!("triggered {} at {}", request.pipeline, request.git_ref));
        Ok(())
    }
}
