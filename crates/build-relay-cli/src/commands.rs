// crates/build-relay-cli/src/commands.rs
// ============================================================================
// Module: Built-In Commands
// Description: The `build` and `info` commands and the `build_finished` event.
// Purpose: Connect configured projects to the build trigger.
// Dependencies: build-relay-config, build-relay-core, build-relay-trigger,
// serde, serde_json
// ============================================================================

//! ## Overview
//! - `build PROJECT [REF]` runs the project's prepare command in the sandbox,
//!   then starts its pipeline at `REF` or the project's default ref.
//! - `info PROJECT` describes the project's build setup.
//! - `build_finished` announces a build result on the project's channel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use build_relay_config::ProjectConfig;
use build_relay_config::RelayConfig;
use build_relay_core::CommandHandler;
use build_relay_core::CommandRouterBuilder;
use build_relay_core::EventHandler;
use build_relay_core::HelpSpec;
use build_relay_core::InvocationContext;
use build_relay_core::InvocationError;
use build_relay_core::ResultExt;
use build_relay_trigger::BuildTrigger;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Title of the build-result event.
pub const BUILD_FINISHED_EVENT: &str = "build_finished";
/// Build status treated as success by `build_finished`.
const SUCCESS_STATUS: &str = "SUCCESS";

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Registers every built-in command and event on `builder`.
#[must_use]
pub fn register_builtins(
    builder: CommandRouterBuilder,
    config: &Arc<RelayConfig>,
    trigger: BuildTrigger,
) -> CommandRouterBuilder {
    builder
        .register(
            "build",
            HelpSpec::patterns([
                ("", "build the project's default ref"),
                ("REF", "build REF"),
            ]),
            1,
            BuildCommand {
                config: Arc::clone(config),
                trigger,
            },
        )
        .register("info", "show the project's build setup", 0, InfoCommand {
            config: Arc::clone(config),
        })
        .event(BUILD_FINISHED_EVENT, BuildFinishedEvent)
}

/// Returns the configured project for the invocation's project token.
fn configured_project<'a>(
    config: &'a RelayConfig,
    ctx: &InvocationContext,
) -> Result<(&'a str, &'a ProjectConfig), InvocationError> {
    let name = ctx.project_name().unwrap_or_default();
    config
        .projects
        .get_key_value(name)
        .map(|(name, project)| (name.as_str(), project))
        .ok_or_else(|| InvocationError::unhandled(format!("project '{name}' is not configured")))
}

// ============================================================================
// SECTION: Build
// ============================================================================

/// `build PROJECT [REF]`.
pub struct BuildCommand {
    /// Relay configuration.
    config: Arc<RelayConfig>,
    /// Pipeline trigger.
    trigger: BuildTrigger,
}

impl CommandHandler for BuildCommand {
    fn execute(&self, ctx: &mut InvocationContext, args: &[String]) -> Result<(), InvocationError> {
        let (name, project) = configured_project(&self.config, ctx)?;
        let git_ref = args.first().map_or(project.default_ref.as_str(), String::as_str);
        if let Some((program, rest)) =
            project.prepare_command.as_deref().and_then(<[String]>::split_first)
        {
            ctx.debug(&format!("preparing {name}: {program} {}", rest.join(" ")));
            let output = ctx.run_process(program, rest)?;
            if !output.stdout.trim().is_empty() {
                ctx.debug(output.stdout.trim_end());
            }
        }
        self.trigger.start_build(ctx, &project.pipeline, git_ref)?;
        ctx.info(&format!("Build of {name} at {git_ref} requested ({}).", project.pipeline));
        Ok(())
    }
}

// ============================================================================
// SECTION: Info
// ============================================================================

/// `info PROJECT`.
pub struct InfoCommand {
    /// Relay configuration.
    config: Arc<RelayConfig>,
}

impl CommandHandler for InfoCommand {
    fn execute(&self, ctx: &mut InvocationContext, _args: &[String]) -> Result<(), InvocationError> {
        let (name, project) = configured_project(&self.config, ctx)?;
        let channel = ctx.channel_name().unwrap_or_else(|| "none".to_string());
        let prepare = project
            .prepare_command
            .as_ref()
            .map_or_else(|| "none".to_string(), |command| command.join(" "));
        ctx.info(&format!(
            "{name}: pipeline {}, default ref {}, channel {channel}, prepare {prepare}",
            project.pipeline, project.default_ref
        ));
        Ok(())
    }
}

// ============================================================================
// SECTION: Build Finished
// ============================================================================

/// Payload of the `build_finished` event.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildFinished {
    /// Project name.
    pub project: String,
    /// Pipeline that ran.
    pub pipeline: String,
    /// Build status, e.g. `SUCCESS` or `FAILURE`.
    pub status: String,
    /// Link to the build.
    #[serde(default)]
    pub url: Option<String>,
}

/// Announces build results on the project's channel.
pub struct BuildFinishedEvent;

impl EventHandler for BuildFinishedEvent {
    fn handle(&self, ctx: &mut InvocationContext, body: &str) -> Result<(), InvocationError> {
        let payload: BuildFinished =
            serde_json::from_str(body).or_unhandled("malformed build_finished payload")?;
        ctx.set_project_name(payload.project.as_str());
        let mut message = format!(
            "Build of {} ({}) finished: {}",
            payload.project, payload.pipeline, payload.status
        );
        if let Some(url) = &payload.url {
            message.push_str(&format!(" {url}"));
        }
        if payload.status.eq_ignore_ascii_case(SUCCESS_STATUS) {
            ctx.info(&message);
        } else {
            ctx.warn(&message);
        }
        Ok(())
    }
}
