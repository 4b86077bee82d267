// crates/build-relay-trigger/tests/trigger.rs
// ============================================================================
// Module: Build Trigger Tests
// Description: End-to-end trigger tests against a local HTTP server.
// Purpose: Validate request shape, dry runs, and failure reporting.
// Dependencies: build-relay-trigger, build-relay-core, tiny_http, tempfile
// ============================================================================

//! ## Overview
//! A `tiny_http` server stands in for the build service and records the
//! single request it receives.

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

use std::io::Read;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

use build_relay_core::EngineServices;
use build_relay_core::EngineSettings;
use build_relay_core::InvocationContext;
use build_relay_core::LogLevel;
use build_relay_core::MemoryLogSink;
use build_relay_core::Origin;
use build_relay_core::Project;
use build_relay_core::ProjectCatalog;
use build_relay_trigger::BuildServiceConfig;
use build_relay_trigger::BuildTrigger;
use tempfile::TempDir;
use tiny_http::Response;
use tiny_http::Server;
use url::Url;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Request fields observed by the fake build service.
#[derive(Debug)]
struct Captured {
    method: String,
    url: String,
    authorization: Option<String>,
    content_type: Option<String>,
    body: String,
}

/// Serves one request with `status` and returns what it saw.
fn serve_once(status: u16) -> (String, JoinHandle<Captured>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let base = format!("http://{}", server.server_addr());
    let handle = thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let header = |name: &str| {
            request
                .headers()
                .iter()
                .find(|header| header.field.as_str().as_str().eq_ignore_ascii_case(name))
                .map(|header| header.value.as_str().to_string())
        };
        let authorization = header("Authorization");
        let content_type = header("Content-Type");
        let mut body = String::new();
        request.as_reader().read_to_string(&mut body).unwrap();
        let captured = Captured {
            method: request.method().as_str().to_string(),
            url: request.url().to_string(),
            authorization,
            content_type,
            body,
        };
        request.respond(Response::empty(status)).unwrap();
        captured
    });
    (base, handle)
}

fn context(initiator: Option<&str>) -> (InvocationContext, Arc<MemoryLogSink>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(MemoryLogSink::new());
    let services = EngineServices::builder(
        EngineSettings::new(dir.path()),
        ProjectCatalog::new([Project::new("webapp")]),
    )
    .log_sink(log.clone())
    .build();
    let origin = match initiator {
        Some(user) => Origin::http().with_initiator(user),
        None => Origin::http(),
    };
    let mut ctx = InvocationContext::new(services, "build", origin);
    ctx.set_project_name("webapp");
    (ctx, log, dir)
}

fn real_trigger(base: &str) -> BuildTrigger {
    let config = BuildServiceConfig::new(Url::parse(base).unwrap())
        .with_credentials("relay", "token123")
        .with_real_builds(true);
    BuildTrigger::from_config(&config).unwrap()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn successful_trigger_posts_form_with_basic_auth() {
    let (base, handle) = serve_once(201);
    let (mut ctx, log, _dir) = context(Some("alice"));

    assert!(real_trigger(&base).trigger_build(&mut ctx, "webapp-main", "refs/heads/main"));
    let captured = handle.join().unwrap();

    assert_eq!(captured.method, "POST");
    assert_eq!(captured.url, "/job/webapp-main/buildWithParameters");
    // base64("relay:token123")
    assert_eq!(captured.authorization.as_deref(), Some("Basic cmVsYXk6dG9rZW4xMjM="));
    assert_eq!(captured.content_type.as_deref(), Some("application/x-www-form-urlencoded"));
    assert_eq!(
        captured.body,
        "GIT_REF=refs%2Fheads%2Fmain&EXPIRE_CACHE=false&INITIATED_BY=alice"
    );
    assert_eq!(ctx.http_response().unwrap().status, 200);
    assert!(log.contains("build{webapp} triggered webapp-main at refs/heads/main"));
}

#[test]
fn missing_initiator_uses_default_label() {
    let (base, handle) = serve_once(200);
    let (mut ctx, _log, _dir) = context(None);
    assert!(real_trigger(&base).trigger_build(&mut ctx, "api", "v1"));
    let captured = handle.join().unwrap();
    assert!(captured.body.ends_with("INITIATED_BY=build-relay"));
}

#[test]
fn non_success_status_is_reported_as_bad_gateway() {
    let (base, handle) = serve_once(500);
    let (mut ctx, log, _dir) = context(None);
    assert!(!real_trigger(&base).trigger_build(&mut ctx, "webapp-main", "main"));
    handle.join().unwrap();

    let response = ctx.http_response().unwrap();
    assert_eq!(response.status, 502);
    assert!(response.body.contains("Failed to trigger webapp-main at main"));
    assert!(response.body.contains("http status 500"));
    assert_eq!(log.lines_at(LogLevel::Error).len(), 1);
}

#[test]
fn start_build_returns_the_delivered_failure() {
    let (base, handle) = serve_once(404);
    let (mut ctx, _log, _dir) = context(None);
    let err = real_trigger(&base).start_build(&mut ctx, "webapp-main", "main").unwrap_err();
    handle.join().unwrap();

    assert!(err.is_reported());
    let response = ctx.http_response().unwrap();
    assert_eq!(response.body, format!("{}\n", err.message()));
    assert_eq!(
        err.message(),
        "Failed to trigger webapp-main at main: build service returned http status 404"
    );
}

#[test]
fn unreachable_service_is_reported_without_retry() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let (mut ctx, _log, _dir) = context(None);
    let trigger = real_trigger(&format!("http://127.0.0.1:{port}"));
    assert!(!trigger.trigger_build(&mut ctx, "webapp-main", "main"));
    let response = ctx.http_response().unwrap();
    assert_eq!(response.status, 502);
    assert!(response.body.contains("build service unreachable"));
}

#[test]
fn dry_run_warns_and_sends_nothing() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let base = format!("http://{}", server.server_addr());
    let config = BuildServiceConfig::new(Url::parse(&base).unwrap());
    let trigger = BuildTrigger::from_config(&config).unwrap();
    let (mut ctx, log, _dir) = context(Some("bob"));

    assert!(!trigger.real_builds());
    assert!(trigger.trigger_build(&mut ctx, "webapp-main", "main"));
    assert!(server.try_recv().unwrap().is_none());
    assert_eq!(
        log.lines_at(LogLevel::Warn),
        vec!["build{webapp} Dry run: would trigger webapp-main at main for bob".to_string()]
    );
    assert_eq!(ctx.http_response().unwrap().status, 200);
}
