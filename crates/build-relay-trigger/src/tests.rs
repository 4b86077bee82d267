// crates/build-relay-trigger/src/tests.rs
// ============================================================================
// Module: Trigger Unit Tests
// Description: Unit tests for endpoint construction and config rendering.
// Purpose: Pin URL layout and credential redaction.
// Dependencies: build-relay-trigger
// ============================================================================

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

use url::Url;

use crate::client::HttpBuildService;
use crate::config::BuildServiceConfig;

fn service(base: &str) -> HttpBuildService {
    HttpBuildService::new(&BuildServiceConfig::new(Url::parse(base).unwrap())).unwrap()
}

#[test]
fn endpoint_appends_job_path() {
    let url = service("https://jenkins.internal").endpoint("webapp-main").unwrap();
    assert_eq!(url.as_str(), "https://jenkins.internal/job/webapp-main/buildWithParameters");
}

#[test]
fn endpoint_keeps_base_path_and_ignores_trailing_slash() {
    let url = service("https://ci.example.com/jenkins/").endpoint("api").unwrap();
    assert_eq!(url.as_str(), "https://ci.example.com/jenkins/job/api/buildWithParameters");
}

#[test]
fn endpoint_escapes_pipeline_names() {
    let url = service("https://jenkins.internal").endpoint("release/train 2").unwrap();
    assert_eq!(
        url.as_str(),
        "https://jenkins.internal/job/release%2Ftrain%202/buildWithParameters"
    );
}

#[test]
fn debug_output_redacts_token() {
    let config = BuildServiceConfig::new(Url::parse("https://jenkins.internal").unwrap())
        .with_credentials("relay", "s3cret");
    let rendered = format!("{config:?}");
    assert!(rendered.contains("relay"));
    assert!(!rendered.contains("s3cret"));
}
