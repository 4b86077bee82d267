// crates/build-relay-core/src/error.rs
// ============================================================================
// Module: Invocation Errors
// Description: Two-tier failure taxonomy for command and event invocations.
// Purpose: Distinguish failures already shown to the user from unhandled ones.
// Dependencies: thiserror, std
// ============================================================================

//! ## Overview
//! Handler logic returns [`InvocationError`]. The dispatch boundary matches on
//! the variant rather than on where the error was raised:
//! - [`InvocationError::Reported`]: the message was already delivered through
//!   the reporter; the boundary only logs the sandbox path and cleans up.
//! - [`InvocationError::Unhandled`]: anything else; the boundary reports it
//!   with its diagnostic trace and preserves the sandbox.
//!
//! Infrastructure errors convert into `Unhandled` through `From`, so handler
//! code can use `?` freely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::backtrace::Backtrace;
use std::backtrace::BacktraceStatus;
use std::error::Error as StdError;
use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::process::ProcessError;
use crate::sandbox::SandboxError;

// ============================================================================
// SECTION: Invocation Error
// ============================================================================

/// Boxed cause carried by unhandled failures.
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Failure raised by handler logic or by the dispatch engine itself.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// Failure whose message has already been delivered to the user.
    #[error("{message}")]
    Reported {
        /// Message that was delivered.
        message: String,
    },
    /// Failure that has not been shown to anyone yet.
    #[error("{message}")]
    Unhandled {
        /// Failure text.
        message: String,
        /// Underlying cause, when the failure wraps another error.
        #[source]
        cause: Option<BoxedCause>,
        /// Backtrace rendered at construction; empty when the platform has none.
        trace: String,
    },
}

impl InvocationError {
    /// Builds an already-reported failure.
    #[must_use]
    pub fn reported(message: impl Into<String>) -> Self {
        Self::Reported {
            message: message.into(),
        }
    }

    /// Builds an unhandled failure with no underlying cause.
    #[must_use]
    pub fn unhandled(message: impl Into<String>) -> Self {
        Self::Unhandled {
            message: message.into(),
            cause: None,
            trace: capture_trace(),
        }
    }

    /// Wraps an arbitrary error as an unhandled failure.
    #[must_use]
    pub fn wrap(message: impl Into<String>, cause: impl StdError + Send + Sync + 'static) -> Self {
        Self::Unhandled {
            message: message.into(),
            cause: Some(Box::new(cause)),
            trace: capture_trace(),
        }
    }

    /// Returns true when the message was already delivered.
    #[must_use]
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Reported { .. })
    }

    /// Returns the top-level failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Reported {
                message,
            }
            | Self::Unhandled {
                message, ..
            } => message,
        }
    }

    /// Renders the message, its cause chain, and the captured backtrace.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let mut out = self.message().to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            let _ = write!(out, "\ncaused by: {cause}");
            source = cause.source();
        }
        if let Self::Unhandled {
            trace, ..
        } = self
            && !trace.is_empty()
        {
            let _ = write!(out, "\n{trace}");
        }
        out
    }
}

impl From<io::Error> for InvocationError {
    fn from(err: io::Error) -> Self {
        Self::wrap(format!("i/o failure: {err}"), err)
    }
}

impl From<SandboxError> for InvocationError {
    fn from(err: SandboxError) -> Self {
        Self::wrap(err.to_string(), err)
    }
}

impl From<ProcessError> for InvocationError {
    fn from(err: ProcessError) -> Self {
        Self::wrap(err.to_string(), err)
    }
}

/// Convenience conversion for results carrying foreign errors.
pub trait ResultExt<T> {
    /// Maps the error into an unhandled failure prefixed with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Unhandled`] when `self` is an error.
    fn or_unhandled(self, context: &str) -> Result<T, InvocationError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn or_unhandled(self, context: &str) -> Result<T, InvocationError> {
        self.map_err(|err| InvocationError::wrap(format!("{context}: {err}"), err))
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// How an invocation ended, as seen from the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// Handler logic returned normally; the sandbox was cleaned up.
    Completed,
    /// An already-reported failure ended the invocation; the sandbox was
    /// cleaned up.
    Recovered {
        /// Message that had been delivered.
        message: String,
    },
    /// An unhandled failure ended the invocation; the sandbox was preserved.
    Unhandled {
        /// Full report that was delivered, including diagnostics.
        report: String,
        /// Preserved sandbox path.
        sandbox: PathBuf,
    },
}

impl InvocationOutcome {
    /// Returns true for [`InvocationOutcome::Unhandled`].
    #[must_use]
    pub const fn is_unhandled(&self) -> bool {
        matches!(self, Self::Unhandled { .. })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Captures a backtrace regardless of `RUST_BACKTRACE`.
fn capture_trace() -> String {
    let backtrace = Backtrace::force_capture();
    match backtrace.status() {
        BacktraceStatus::Captured => backtrace.to_string(),
        _ => String::new(),
    }
}
