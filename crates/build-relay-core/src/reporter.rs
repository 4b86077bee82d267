// crates/build-relay-core/src/reporter.rs
// ============================================================================
// Module: Invocation Reporter
// Description: Severity-tagged output for invocations across all sinks.
// Purpose: Emit user-facing messages and prefixed log lines in one call.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Reporter operations are methods on [`InvocationContext`]. Each one sends the
//! message to the output sinks (see the `routing` module) and writes every line
//! of it to the log sink, prefixed with `<handler>{<project>|unknown} `.
//! [`InvocationContext::fail`] is the already-reported variant of
//! [`InvocationContext::error`]: it reports, then hands back the
//! [`InvocationError::Reported`] value for the caller to return.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::context::InvocationContext;
use crate::error::InvocationError;
use crate::log::LogLevel;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Project label used in log prefixes before a project is known.
const UNKNOWN_PROJECT: &str = "unknown";

// ============================================================================
// SECTION: Reporter Operations
// ============================================================================

impl InvocationContext {
    /// Returns the log prefix for this invocation.
    #[must_use]
    pub fn log_prefix(&self) -> String {
        format!(
            "{}{{{}}} ",
            self.handler_name(),
            self.project_name().unwrap_or(UNKNOWN_PROJECT)
        )
    }

    /// Writes each line of `message` to the log sink at `level`.
    pub fn log(&self, level: LogLevel, message: &str) {
        let prefix = self.log_prefix();
        for line in message.lines() {
            self.services.log().record(level, &format!("{prefix}{line}"));
        }
    }

    /// Reports a failure to every sink and sets the HTTP status.
    pub fn error(&mut self, message: &str, status: u16) {
        if let Some(response) = self.http_response.as_mut() {
            response.status = status;
        }
        self.send_message(message);
        self.log(LogLevel::Error, message);
    }

    /// Reports a failure and returns it as already reported.
    #[must_use = "the returned error must be propagated to the dispatch boundary"]
    pub fn fail(&mut self, message: impl Into<String>, status: u16) -> InvocationError {
        let message = message.into();
        self.error(&message, status);
        InvocationError::reported(message)
    }

    /// Emits a warning to every sink.
    pub fn warn(&mut self, message: &str) {
        self.send_message(message);
        self.log(LogLevel::Warn, message);
    }

    /// Emits an informational message to every sink.
    pub fn info(&mut self, message: &str) {
        self.send_message(message);
        self.log(LogLevel::Info, message);
    }

    /// Logs a debug message, replying privately when enabled.
    pub fn debug(&self, message: &str) {
        if self.services.settings().debug_private_messages
            && let Some(reply) = &self.reply
            && let Err(err) = reply.reply(message)
        {
            self.log(LogLevel::Error, &format!("debug reply failed: {err}"));
        }
        self.log(LogLevel::Debug, message);
    }
}
