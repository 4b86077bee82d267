// crates/build-relay-core/src/transport.rs
// ============================================================================
// Module: Chat Transport Interfaces
// Description: Reply and channel-broadcast seams to the chat network.
// Purpose: Keep chat connectivity outside the engine behind small traits.
// Dependencies: thiserror, std
// ============================================================================

//! ## Overview
//! The engine never talks to a chat network directly. A [`ReplyTarget`] is the
//! direct-reply binding of one inbound message; a [`ChatTransport`] lists
//! channels and broadcasts to them. In-memory implementations are provided for
//! consoles, tests, and deployments without a chat network.
//! Invariants:
//! - Delivery failures are returned, never panicked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::PoisonError;

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors emitted by reply and broadcast sinks.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The chat network rejected or dropped the message.
    #[error("delivery failed: {0}")]
    Failed(String),
}

// ============================================================================
// SECTION: Channel Handles
// ============================================================================

/// Resolved chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    /// Transport-specific channel id.
    pub id: String,
    /// Human-readable channel name.
    pub name: String,
}

impl ChannelHandle {
    /// Creates a channel handle.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Direct-reply binding for one inbound message.
pub trait ReplyTarget: Send + Sync {
    /// Replies to the originating message.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the reply cannot be delivered.
    fn reply(&self, message: &str) -> Result<(), DeliveryError>;
}

/// Channel listing and broadcast for the chat network.
pub trait ChatTransport: Send + Sync {
    /// Returns the channels visible to the bot.
    fn channels(&self) -> Vec<ChannelHandle>;

    /// Broadcasts a message to a channel.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] when the broadcast fails.
    fn broadcast(&self, channel: &ChannelHandle, message: &str) -> Result<(), DeliveryError>;
}

// ============================================================================
// SECTION: Fuzzy Lookup
// ============================================================================

/// Finds a channel by loose name match.
///
/// The query and channel names are trimmed, stripped of a leading `#`, and
/// lowercased. An exact name or id match wins; otherwise a single channel
/// whose name starts with the query is returned.
#[must_use]
pub fn fuzzy_find(channels: &[ChannelHandle], query: &str) -> Option<ChannelHandle> {
    let wanted = normalize(query);
    if wanted.is_empty() {
        return None;
    }
    if let Some(exact) = channels
        .iter()
        .find(|channel| normalize(&channel.name) == wanted || normalize(&channel.id) == wanted)
    {
        return Some(exact.clone());
    }
    let mut prefixed = channels.iter().filter(|channel| normalize(&channel.name).starts_with(&wanted));
    match (prefixed.next(), prefixed.next()) {
        (Some(only), None) => Some(only.clone()),
        _ => None,
    }
}

/// Normalizes a channel name for comparison.
fn normalize(name: &str) -> String {
    name.trim().trim_start_matches('#').to_ascii_lowercase()
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

/// Transport with no channels; every broadcast is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl ChatTransport for NullTransport {
    fn channels(&self) -> Vec<ChannelHandle> {
        Vec::new()
    }

    fn broadcast(&self, _channel: &ChannelHandle, _message: &str) -> Result<(), DeliveryError> {
        Ok(())
    }
}

/// Transport with a fixed channel list that records broadcasts.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    /// Channels reported by [`ChatTransport::channels`].
    channels: Vec<ChannelHandle>,
    /// Delivered broadcasts as `(channel name, message)` pairs.
    sent: Mutex<Vec<(String, String)>>,
}

impl MemoryTransport {
    /// Creates a transport exposing `channels`.
    #[must_use]
    pub fn new(channels: Vec<ChannelHandle>) -> Self {
        Self {
            channels,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Creates a transport whose channel ids equal their names.
    #[must_use]
    pub fn with_names(names: &[&str]) -> Self {
        Self::new(names.iter().map(|name| ChannelHandle::new(*name, *name)).collect())
    }

    /// Returns the recorded broadcasts.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ChatTransport for MemoryTransport {
    fn channels(&self) -> Vec<ChannelHandle> {
        self.channels.clone()
    }

    fn broadcast(&self, channel: &ChannelHandle, message: &str) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((channel.name.clone(), message.to_string()));
        Ok(())
    }
}

/// Reply binding that records replies in memory.
#[derive(Debug, Default)]
pub struct MemoryReply {
    /// Recorded replies in delivery order.
    replies: Mutex<Vec<String>>,
}

impl MemoryReply {
    /// Creates an empty reply recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded replies.
    #[must_use]
    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ReplyTarget for MemoryReply {
    fn reply(&self, message: &str) -> Result<(), DeliveryError> {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).push(message.to_string());
        Ok(())
    }
}
