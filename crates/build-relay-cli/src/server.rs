// crates/build-relay-cli/src/server.rs
// ============================================================================
// Module: HTTP Front End
// Description: Blocking HTTP listener that feeds commands and events to the router.
// Purpose: Bind invocations to HTTP responses.
// Dependencies: build-relay-core, tiny_http, tracing
// ============================================================================

//! ## Overview
//! Routes:
//! - `POST /command`: body is the command text; `X-Relay-User` names the
//!   initiator. Text that names no command yields 404.
//! - `POST /events/<title>`: body is handed to the event handler.
//!
//! Each request runs on its own thread. The response status and body come
//! from the invocation's HTTP binding.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use build_relay_core::CommandRouter;
use build_relay_core::InvocationReport;
use build_relay_core::Origin;
use thiserror::Error;
use tiny_http::Header;
use tiny_http::Method;
use tiny_http::Request;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header naming the requesting user.
pub const USER_HEADER: &str = "X-Relay-User";
/// Maximum accepted request body size.
const MAX_BODY_BYTES: u64 = 64 * 1024;
/// Command route.
const COMMAND_PATH: &str = "/command";
/// Event route prefix.
const EVENTS_PREFIX: &str = "/events/";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// HTTP front-end failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {message}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying error text.
        message: String,
    },
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP listener bound to a router.
pub struct RelayServer {
    /// Listener.
    server: Server,
    /// Shared router.
    router: Arc<CommandRouter>,
}

impl RelayServer {
    /// Binds `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the address cannot be bound.
    pub fn bind(addr: &str, router: Arc<CommandRouter>) -> Result<Self, ServerError> {
        let server = Server::http(addr).map_err(|err| ServerError::Bind {
            addr: addr.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            server,
            router,
        })
    }

    /// Returns the bound socket address.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serves requests until the listener shuts down.
    pub fn run(&self) {
        for request in self.server.incoming_requests() {
            let router = Arc::clone(&self.router);
            thread::spawn(move || handle_request(&router, request));
        }
    }
}

// ============================================================================
// SECTION: Request Handling
// ============================================================================

/// Status, body pair sent back to the client.
type Reply = (u16, String);

/// Handles one request and sends the response.
fn handle_request(router: &CommandRouter, mut request: Request) {
    let (status, body) = route(router, &mut request);
    tracing::debug!(method = %request.method(), url = request.url(), status, "http request");
    let mut response = Response::from_string(body).with_status_code(status);
    if let Ok(header) = Header::from_bytes("Content-Type", "text/plain; charset=utf-8") {
        response = response.with_header(header);
    }
    if let Err(err) = request.respond(response) {
        tracing::warn!(error = %err, "failed to send http response");
    }
}

/// Routes a request to the command or event path.
fn route(router: &CommandRouter, request: &mut Request) -> Reply {
    if request.method() != &Method::Post {
        return (405, "method not allowed\n".to_string());
    }
    let path = request.url().split('?').next().unwrap_or_default().to_string();
    let user = header_value(request, USER_HEADER);
    let body = match read_body(request) {
        Ok(body) => body,
        Err(reply) => return reply,
    };
    let mut origin = Origin::http();
    if let Some(user) = user {
        origin = origin.with_initiator(user);
    }
    if path == COMMAND_PATH {
        return router
            .dispatch(body.trim(), origin)
            .map_or_else(|| (404, "unknown command\n".to_string()), into_reply);
    }
    if let Some(title) = path.strip_prefix(EVENTS_PREFIX)
        && !title.is_empty()
    {
        return into_reply(router.handle_event(title, &body, origin));
    }
    (404, "not found\n".to_string())
}

/// Converts an invocation report into a response.
fn into_reply(report: InvocationReport) -> Reply {
    report
        .http_response
        .map_or_else(|| (200, String::new()), |response| (response.status, response.body))
}

/// Returns the value of header `name`, if present.
fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|header| header.value.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Reads the request body as UTF-8 within the size limit.
fn read_body(request: &mut Request) -> Result<String, Reply> {
    let mut bytes = Vec::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|err| (400, format!("failed to read body: {err}\n")))?;
    if bytes.len() as u64 > MAX_BODY_BYTES {
        return Err((413, "request body too large\n".to_string()));
    }
    String::from_utf8(bytes).map_err(|_| (400, "request body must be utf-8\n".to_string()))
}
