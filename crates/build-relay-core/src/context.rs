// crates/build-relay-core/src/context.rs
// ============================================================================
// Module: Invocation Context
// Description: Per-invocation state handed to command and event handlers.
// Purpose: Own the id, bindings, and lazily computed resources of one invocation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! An [`InvocationContext`] is created for every dispatched command or event
//! and dropped when the dispatch boundary exits. It owns everything that is
//! private to the invocation: its id, the reply and HTTP-response bindings, the
//! memoized sandbox path, and the memoized channel resolution. Output and
//! routing operations live in the `reporter` and `routing` modules as further
//! `impl` blocks on this type.
//! Invariants:
//! - The id is allocated exactly once, at construction.
//! - The sandbox is prepared at most once per context.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::InvocationError;
use crate::identity::InvocationId;
use crate::process::ProcessOutput;
use crate::services::EngineServices;
use crate::settings::Project;
use crate::transport::ChannelHandle;
use crate::transport::ReplyTarget;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default HTTP status of a bound response.
pub const DEFAULT_HTTP_STATUS: u16 = 200;
/// Environment variable carrying the invocation id to child processes.
pub const INVOCATION_ENV_VAR: &str = "BUILD_RELAY_INVOCATION";

// ============================================================================
// SECTION: Origin
// ============================================================================

/// Bindings describing where an invocation came from.
#[derive(Clone, Default)]
pub struct Origin {
    /// Direct-reply binding.
    reply: Option<Arc<dyn ReplyTarget>>,
    /// Whether an HTTP response is bound.
    http: bool,
    /// Requesting user.
    initiator: Option<String>,
}

impl Origin {
    /// Origin with no reply and no HTTP binding.
    #[must_use]
    pub fn detached() -> Self {
        Self::default()
    }

    /// Origin bound to a direct reply.
    #[must_use]
    pub fn reply(target: Arc<dyn ReplyTarget>) -> Self {
        Self {
            reply: Some(target),
            ..Self::default()
        }
    }

    /// Origin bound to an HTTP response.
    #[must_use]
    pub fn http() -> Self {
        Self {
            http: true,
            ..Self::default()
        }
    }

    /// Records the requesting user.
    #[must_use]
    pub fn with_initiator(mut self, user: impl Into<String>) -> Self {
        self.initiator = Some(user.into());
        self
    }

    /// Drops the direct-reply binding.
    pub(crate) fn without_reply(mut self) -> Self {
        self.reply = None;
        self
    }
}

// ============================================================================
// SECTION: HTTP Response Binding
// ============================================================================

/// Response accumulated for HTTP-originated invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code to send.
    pub status: u16,
    /// Newline-terminated messages emitted during the invocation.
    pub body: String,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self {
            status: DEFAULT_HTTP_STATUS,
            body: String::new(),
        }
    }
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// State of one command or event invocation.
pub struct InvocationContext {
    /// Shared engine collaborators.
    pub(crate) services: Arc<EngineServices>,
    /// Invocation id.
    id: InvocationId,
    /// Command name or event title.
    handler_name: String,
    /// Project token, once known.
    project_name: Option<String>,
    /// Direct-reply binding.
    pub(crate) reply: Option<Arc<dyn ReplyTarget>>,
    /// Bound HTTP response.
    pub(crate) http_response: Option<HttpResponse>,
    /// Requesting user.
    initiator: Option<String>,
    /// Prepared sandbox path.
    sandbox: Option<PathBuf>,
    /// Channel resolution; `Some(None)` records a failed lookup.
    pub(crate) channel: Option<Option<ChannelHandle>>,
}

impl InvocationContext {
    /// Creates a context, allocating a fresh invocation id.
    #[must_use]
    pub fn new(
        services: Arc<EngineServices>,
        handler_name: impl Into<String>,
        origin: Origin,
    ) -> Self {
        let id = services.allocator().next_id();
        Self {
            services,
            id,
            handler_name: handler_name.into(),
            project_name: None,
            reply: origin.reply,
            http_response: origin.http.then(HttpResponse::default),
            initiator: origin.initiator,
            sandbox: None,
            channel: None,
        }
    }

    /// Returns the invocation id.
    #[must_use]
    pub const fn id(&self) -> InvocationId {
        self.id
    }

    /// Returns the command name or event title.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler_name
    }

    /// Returns the project token, if one has been set.
    #[must_use]
    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    /// Sets the project for this invocation and drops any cached channel.
    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.project_name = Some(name.into());
        self.channel = None;
    }

    /// Returns the configured project matching the project token.
    #[must_use]
    pub fn project(&self) -> Option<&Project> {
        self.project_name.as_deref().and_then(|name| self.services.projects().get(name))
    }

    /// Returns the requesting user.
    #[must_use]
    pub fn initiator(&self) -> Option<&str> {
        self.initiator.as_deref()
    }

    /// Returns true when a direct-reply binding exists.
    #[must_use]
    pub const fn has_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Returns the bound HTTP response, if any.
    #[must_use]
    pub const fn http_response(&self) -> Option<&HttpResponse> {
        self.http_response.as_ref()
    }

    /// Returns the shared engine services.
    #[must_use]
    pub fn services(&self) -> &EngineServices {
        &self.services
    }

    /// Returns the sandbox directory, preparing it on first access.
    ///
    /// # Errors
    ///
    /// Returns an unhandled [`InvocationError`] when the sandbox cannot be
    /// prepared.
    pub fn sandbox_directory(&mut self) -> Result<PathBuf, InvocationError> {
        if let Some(path) = &self.sandbox {
            return Ok(path.clone());
        }
        let path = self.services.sandboxes().prepare(self.id)?;
        self.sandbox = Some(path.clone());
        Ok(path)
    }

    /// Returns the sandbox path without creating it.
    #[must_use]
    pub fn sandbox_path(&self) -> PathBuf {
        self.sandbox.clone().unwrap_or_else(|| self.services.sandboxes().path_for(self.id))
    }

    /// Runs an external program inside the sandbox with the engine timeout.
    ///
    /// # Errors
    ///
    /// Returns an unhandled [`InvocationError`] when the sandbox cannot be
    /// prepared or the process fails.
    pub fn run_process<S: AsRef<str>>(
        &mut self,
        program: &str,
        args: &[S],
    ) -> Result<ProcessOutput, InvocationError> {
        let cwd = self.sandbox_directory()?;
        let env = [(INVOCATION_ENV_VAR, self.id.to_string())];
        let output = self.services.runner().run(&cwd, program, args, &env)?;
        Ok(output)
    }

    /// Consumes the context and returns the bound HTTP response.
    pub(crate) fn into_http_response(self) -> Option<HttpResponse> {
        self.http_response
    }
}
