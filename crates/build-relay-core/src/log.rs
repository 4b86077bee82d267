// crates/build-relay-core/src/log.rs
// ============================================================================
// Module: Invocation Log Sinks
// Description: Process log stream abstraction for invocation output.
// Purpose: Route prefixed log lines to tracing or to an in-memory buffer.
// Dependencies: tracing, std
// ============================================================================

//! ## Overview
//! The reporter writes every emitted line to a [`LogSink`] with a severity and
//! an invocation prefix. [`TracingLogSink`] forwards to the `tracing` facade so
//! the binary decides formatting and filtering; [`MemoryLogSink`] keeps records
//! for inspection and tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Mutex;
use std::sync::PoisonError;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity of a log line.
///
/// # Invariants
/// - Variants are ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Informational output.
    Info,
    /// Recoverable problems.
    Warn,
    /// Failures.
    Error,
}

impl LogLevel {
    /// Returns a stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single captured log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Fully prefixed line.
    pub line: String,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Destination for the process log stream.
pub trait LogSink: Send + Sync {
    /// Records one already-prefixed line.
    fn record(&self, level: LogLevel, line: &str);
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

/// Log sink that forwards lines to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn record(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "build_relay", "{line}"),
            LogLevel::Info => tracing::info!(target: "build_relay", "{line}"),
            LogLevel::Warn => tracing::warn!(target: "build_relay", "{line}"),
            LogLevel::Error => tracing::error!(target: "build_relay", "{line}"),
        }
    }
}

/// Log sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    /// Captured records in emission order.
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the captured records.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Returns captured lines at `level`.
    #[must_use]
    pub fn lines_at(&self, level: LogLevel) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|record| record.level == level)
            .map(|record| record.line)
            .collect()
    }

    /// Returns true when any captured line contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.records().iter().any(|record| record.line.contains(needle))
    }
}

impl LogSink for MemoryLogSink {
    fn record(&self, level: LogLevel, line: &str) {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).push(LogRecord {
            level,
            line: line.to_string(),
        });
    }
}
