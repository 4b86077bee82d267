// crates/build-relay-core/src/routing.rs
// ============================================================================
// Module: Message Routing
// Description: Destination resolution and multi-sink delivery.
// Purpose: Send invocation output to reply, channel, and HTTP sinks.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A message goes to the direct reply when one is bound, otherwise to the
//! invocation's channel. The channel is the project's inform channel when it
//! declares one, else the default channel; it is resolved by fuzzy lookup once
//! per invocation and cached on the context. Independently, a bound HTTP
//! response accumulates every message in its body.
//! Invariants:
//! - A message is never sent to both the reply and the channel.
//! - Lookup and delivery failures are logged, never escalated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::context::InvocationContext;
use crate::log::LogLevel;
use crate::transport::ChannelHandle;
use crate::transport::fuzzy_find;

// ============================================================================
// SECTION: Routing Operations
// ============================================================================

impl InvocationContext {
    /// Returns the channel name this invocation would broadcast to.
    #[must_use]
    pub fn channel_name(&self) -> Option<String> {
        self.project()
            .and_then(|project| project.inform_channel.clone())
            .or_else(|| self.services.settings().default_channel.clone())
    }

    /// Resolves the broadcast channel, caching the result.
    pub fn resolve_channel(&mut self) -> Option<ChannelHandle> {
        if let Some(cached) = &self.channel {
            return cached.clone();
        }
        let resolved = self.lookup_channel();
        self.channel = Some(resolved.clone());
        resolved
    }

    /// Performs the uncached channel lookup.
    fn lookup_channel(&self) -> Option<ChannelHandle> {
        let name = self.channel_name()?;
        let found = fuzzy_find(&self.services.transport().channels(), &name);
        if found.is_none() {
            self.log(LogLevel::Error, &format!("could not resolve channel '{name}'"));
        }
        found
    }

    /// Delivers `message` to the reply or channel sink and the HTTP body.
    pub fn send_message(&mut self, message: &str) {
        if let Some(reply) = self.reply.clone() {
            if let Err(err) = reply.reply(message) {
                self.log(LogLevel::Error, &format!("reply failed: {err}"));
            }
        } else if let Some(channel) = self.resolve_channel()
            && let Err(err) = self.services.transport().broadcast(&channel, message)
        {
            self.log(LogLevel::Error, &format!("broadcast to '{}' failed: {err}", channel.name));
        }
        if let Some(response) = self.http_response.as_mut() {
            response.body.push_str(message);
            response.body.push('\n');
        }
    }
}
