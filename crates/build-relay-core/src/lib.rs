// crates/build-relay-core/src/lib.rs
// ============================================================================
// Module: Build Relay Core Library
// Description: Command dispatch and invocation lifecycle engine.
// Purpose: Validate chat commands, isolate invocations, and route their output.
// Dependencies: thiserror, tracing
// ============================================================================

//! ## Overview
//! Build Relay Core turns chat commands of the form `COMMAND PROJECT [ARGS...]`
//! and inbound events into isolated invocations. Each invocation gets a unique
//! id, an on-demand sandbox directory, and an [`InvocationContext`] through
//! which handler logic reports to the direct reply, the project channel, a
//! bound HTTP response, and the process log.
//! Invariants:
//! - Invocation ids are unique and strictly increasing per [`EngineServices`].
//! - Sandboxes are removed after completed and already-reported invocations
//!   and preserved after unhandled failures.
//! - Already-reported failures are never reported a second time.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod command;
pub mod context;
pub mod error;
pub mod identity;
pub mod log;
mod panics;
pub mod process;
pub mod reporter;
pub mod router;
pub mod routing;
pub mod sandbox;
pub mod services;
pub mod settings;
pub mod transport;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use command::CommandDefinition;
pub use command::CommandHandler;
pub use command::EventHandler;
pub use command::HelpSpec;
pub use context::HttpResponse;
pub use context::InvocationContext;
pub use context::Origin;
pub use error::InvocationError;
pub use error::InvocationOutcome;
pub use error::ResultExt;
pub use identity::IdentityAllocator;
pub use identity::InvocationId;
pub use log::LogLevel;
pub use log::LogRecord;
pub use log::LogSink;
pub use log::MemoryLogSink;
pub use log::TracingLogSink;
pub use process::DEFAULT_PROCESS_TIMEOUT;
pub use process::ProcessError;
pub use process::ProcessOutput;
pub use process::ProcessRunner;
pub use router::CommandRouter;
pub use router::CommandRouterBuilder;
pub use router::InvocationReport;
pub use sandbox::SandboxError;
pub use sandbox::SandboxManager;
pub use services::EngineServices;
pub use services::EngineServicesBuilder;
pub use settings::EngineSettings;
pub use settings::Project;
pub use settings::ProjectCatalog;
pub use transport::ChannelHandle;
pub use transport::ChatTransport;
pub use transport::DeliveryError;
pub use transport::MemoryReply;
pub use transport::MemoryTransport;
pub use transport::NullTransport;
pub use transport::ReplyTarget;
pub use transport::fuzzy_find;
