// crates/build-relay-cli/tests/server.rs
// ============================================================================
// Module: HTTP Front End Tests
// Description: Tests for the command and event routes of the HTTP server.
// Purpose: Validate that invocation bindings become HTTP responses.
// Dependencies: build-relay-cli, reqwest, tempfile
// ============================================================================

#![allow(dead_code, reason = "Common module may have unused helpers.")]
#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;
use std::thread;

use build_relay_cli::server::RelayServer;
use build_relay_cli::server::USER_HEADER;
use build_relay_trigger::TriggerError;
use reqwest::blocking::Client;

use crate::common::Fixture;
use crate::common::fixture;

/// Starts a server for `fixture` and returns its base URL.
fn start(fixture: Fixture) -> (String, Arc<common::RecordingService>) {
    let service = Arc::clone(&fixture.service);
    let router = Arc::new(fixture.router);
    let server = RelayServer::bind("127.0.0.1:0", router).unwrap();
    let base = format!("http://{}", server.local_addr().unwrap());
    let dir = fixture.dir;
    thread::spawn(move || {
        let _dir = dir;
        server.run();
    });
    (base, service)
}

fn post(url: &str, body: &str) -> (u16, String) {
    let response = Client::new().post(url).body(body.to_string()).send().unwrap();
    let status = response.status().as_u16();
    (status, response.text().unwrap())
}

#[test]
fn command_route_returns_accumulated_messages() {
    let (base, service) = start(fixture("", None));
    let response = Client::new()
        .post(format!("{base}/command"))
        .header(USER_HEADER, "carol")
        .body("build webapp v1")
        .send()
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().unwrap(), "Build of webapp at v1 requested (webapp-main).\n");
    assert_eq!(service.requests.lock().unwrap()[0].initiator, "carol");
}

#[test]
fn validation_failure_returns_bad_request() {
    let (base, _service) = start(fixture("", None));
    let (status, body) = post(&format!("{base}/command"), "build nosuch");
    assert_eq!(status, 400);
    assert!(body.starts_with("Unknown project 'nosuch'. Known projects: api, webapp"));
}

#[test]
fn trigger_failure_returns_bad_gateway() {
    let (base, _service) = start(fixture("", Some(TriggerError::Transport("refused".to_string()))));
    let (status, body) = post(&format!("{base}/command"), "build api");
    assert_eq!(status, 502);
    assert!(body.contains("build service unreachable: refused"));
}

#[test]
fn unknown_command_returns_not_found() {
    let (base, _service) = start(fixture("", None));
    let (status, _body) = post(&format!("{base}/command"), "deploy webapp");
    assert_eq!(status, 404);
}

#[test]
fn event_route_dispatches_by_title() {
    let (base, _service) = start(fixture("", None));
    let (status, body) = post(
        &format!("{base}/events/build_finished"),
        r#"{"project":"webapp","pipeline":"webapp-main","status":"SUCCESS"}"#,
    );
    assert_eq!(status, 200);
    assert_eq!(body, "Build of webapp (webapp-main) finished: SUCCESS\n");
}

#[test]
fn unregistered_event_returns_internal_error() {
    let (base, _service) = start(fixture("", None));
    let (status, body) = post(&format!("{base}/events/mystery"), "{}");
    assert_eq!(status, 500);
    assert!(body.contains("no handler registered for event 'mystery'"));
}

#[test]
fn non_post_requests_are_rejected() {
    let (base, _service) = start(fixture("", None));
    let response = Client::new().get(format!("{base}/command")).send().unwrap();
    assert_eq!(response.status().as_u16(), 405);
}
