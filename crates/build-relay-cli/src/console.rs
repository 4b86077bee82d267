// crates/build-relay-cli/src/console.rs
// ============================================================================
// Module: Console Transport
// Description: Terminal-backed chat transport and interactive command loop.
// Purpose: Drive the relay from stdin with replies and broadcasts on stdout.
// Dependencies: build-relay-config, build-relay-core
// ============================================================================

//! ## Overview
//! The console stands in for a chat service: every configured channel exists,
//! broadcasts print as `[#channel] message`, and direct replies print as-is.
//! [`run_console`] reads one command per line until end of input.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io;
use std::io::BufRead;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use build_relay_config::RelayConfig;
use build_relay_core::ChannelHandle;
use build_relay_core::ChatTransport;
use build_relay_core::CommandRouter;
use build_relay_core::DeliveryError;
use build_relay_core::Origin;
use build_relay_core::ReplyTarget;

// ============================================================================
// SECTION: Writers
// ============================================================================

/// Shared line writer used by the console sinks.
#[derive(Clone)]
pub struct ConsoleWriter {
    /// Underlying output stream.
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl ConsoleWriter {
    /// Writer over the process stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Writer over an arbitrary stream.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Arc::new(Mutex::new(out)),
        }
    }

    /// Writes one line and flushes.
    fn line(&self, text: &str) -> Result<(), DeliveryError> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{text}")
            .and_then(|()| out.flush())
            .map_err(|err| DeliveryError::Failed(err.to_string()))
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Chat transport printing broadcasts to the console.
pub struct ConsoleTransport {
    /// Known channels.
    channels: Vec<ChannelHandle>,
    /// Output stream.
    writer: ConsoleWriter,
}

impl ConsoleTransport {
    /// Creates a transport exposing `names` as channels.
    #[must_use]
    pub fn new<I, S>(names: I, writer: ConsoleWriter) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: BTreeSet<String> = names
            .into_iter()
            .map(|name| name.as_ref().trim().trim_start_matches('#').to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self {
            channels: names.into_iter().map(|name| ChannelHandle::new(name.clone(), name)).collect(),
            writer,
        }
    }

    /// Creates a transport exposing every channel named in `config`.
    #[must_use]
    pub fn from_config(config: &RelayConfig, writer: ConsoleWriter) -> Self {
        let names = config
            .chat
            .default_channel
            .iter()
            .chain(config.projects.values().filter_map(|project| project.inform_channel.as_ref()));
        Self::new(names, writer)
    }
}

impl ChatTransport for ConsoleTransport {
    fn channels(&self) -> Vec<ChannelHandle> {
        self.channels.clone()
    }

    fn broadcast(&self, channel: &ChannelHandle, message: &str) -> Result<(), DeliveryError> {
        self.writer.line(&format!("[#{}] {message}", channel.name))
    }
}

/// Direct-reply sink printing to the console.
pub struct ConsoleReply {
    /// Output stream.
    writer: ConsoleWriter,
}

impl ConsoleReply {
    /// Creates a reply sink over `writer`.
    #[must_use]
    pub const fn new(writer: ConsoleWriter) -> Self {
        Self {
            writer,
        }
    }
}

impl ReplyTarget for ConsoleReply {
    fn reply(&self, message: &str) -> Result<(), DeliveryError> {
        self.writer.line(message)
    }
}

// ============================================================================
// SECTION: Loop
// ============================================================================

/// Counts of what a console session did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleSummary {
    /// Lines dispatched to a command.
    pub dispatched: usize,
    /// Invocations that ended unhandled.
    pub unhandled: usize,
    /// Lines that named no command.
    pub unmatched: usize,
}

/// Reads commands from `input` until end of input.
///
/// Blank lines are skipped; `help` and unknown text reply with usage.
///
/// # Errors
///
/// Returns an I/O error when `input` cannot be read.
pub fn run_console(
    router: &CommandRouter,
    input: impl BufRead,
    reply: &Arc<dyn ReplyTarget>,
    initiator: Option<&str>,
) -> io::Result<ConsoleSummary> {
    let mut summary = ConsoleSummary::default();
    for line in input.lines() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let mut origin = Origin::reply(Arc::clone(reply));
        if let Some(user) = initiator {
            origin = origin.with_initiator(user);
        }
        if text.eq_ignore_ascii_case("help") {
            let _ = reply.reply(&router.usage());
            continue;
        }
        match router.dispatch(text, origin) {
            Some(report) => {
                summary.dispatched += 1;
                if report.outcome.is_unhandled() {
                    summary.unhandled += 1;
                }
            }
            None => {
                summary.unmatched += 1;
                let _ = reply.reply(&format!("Unknown command.\n{}", router.usage()));
            }
        }
    }
    Ok(summary)
}
