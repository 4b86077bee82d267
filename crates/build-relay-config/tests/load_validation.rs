//! Config load validation tests for build-relay-config.
// crates/build-relay-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards and field validation.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use build_relay_config::ConfigError;
use build_relay_config::RelayConfig;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

const MINIMAL: &str = r#"
[projects.webapp]
pipeline = "webapp-main"
"#;

fn assert_invalid(result: Result<RelayConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}

fn write_config(content: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content).map_err(|err| err.to_string())?;
    Ok(file)
}

// ============================================================================
// SECTION: Load Guards
// ============================================================================

#[test]
fn load_reads_minimal_file_with_defaults() -> TestResult {
    let file = write_config(MINIMAL.as_bytes())?;
    let config = RelayConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.build_service.real_builds {
        return Err("real builds must default to off".to_string());
    }
    if config.build_service.base_url != "https://jenkins.internal" {
        return Err(format!("unexpected base url {}", config.build_service.base_url));
    }
    if config.process.timeout_secs != 3600 {
        return Err("process timeout must default to one hour".to_string());
    }
    let project = config.project("webapp").ok_or("missing project")?;
    if project.default_ref != "main" || project.prepare_command.is_some() {
        return Err(format!("unexpected project defaults {project:?}"));
    }
    Ok(())
}

#[test]
fn load_rejects_missing_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    assert_invalid(RelayConfig::load(Some(&dir.path().join("absent.toml"))), "config io error")
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(RelayConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        RelayConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_config(&vec![b'#'; 1_048_577])?;
    assert_invalid(RelayConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_config(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(RelayConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let file = write_config(b"[projects.webapp\npipeline = ")?;
    assert_invalid(RelayConfig::load(Some(file.path())), "config parse error")
}

// ============================================================================
// SECTION: Field Validation
// ============================================================================

#[test]
fn rejects_empty_project_map() -> TestResult {
    assert_invalid(RelayConfig::from_toml_str(""), "at least one project")
}

#[test]
fn rejects_project_name_with_whitespace() -> TestResult {
    assert_invalid(
        RelayConfig::from_toml_str("[projects.\"web app\"]\npipeline = \"p\"\n"),
        "contain no whitespace",
    )
}

#[test]
fn rejects_blank_pipeline() -> TestResult {
    assert_invalid(
        RelayConfig::from_toml_str("[projects.webapp]\npipeline = \"  \"\n"),
        "projects.webapp.pipeline must be set",
    )
}

#[test]
fn rejects_missing_pipeline() -> TestResult {
    assert_invalid(RelayConfig::from_toml_str("[projects.webapp]\n"), "config parse error")
}

#[test]
fn rejects_empty_prepare_command() -> TestResult {
    assert_invalid(
        RelayConfig::from_toml_str(
            "[projects.webapp]\npipeline = \"p\"\nprepare_command = []\n",
        ),
        "prepare_command must name a program",
    )
}

#[test]
fn rejects_non_http_base_url() -> TestResult {
    let text = format!("[build_service]\nbase_url = \"ftp://ci.example.com\"\n{MINIMAL}");
    assert_invalid(RelayConfig::from_toml_str(&text), "must include http:// or https://")
}

#[test]
fn rejects_real_builds_without_credentials() -> TestResult {
    let text = format!("[build_service]\nreal_builds = true\nusername = \"relay\"\n{MINIMAL}");
    assert_invalid(RelayConfig::from_toml_str(&text), "api_token must be set")
}

#[test]
fn accepts_real_builds_with_credentials() -> TestResult {
    let text = format!(
        "[build_service]\nreal_builds = true\nusername = \"relay\"\napi_token = \"t\"\n{MINIMAL}"
    );
    RelayConfig::from_toml_str(&text).map(|_| ()).map_err(|err| err.to_string())
}

#[test]
fn rejects_zero_timeouts() -> TestResult {
    let text = format!("[build_service]\ntimeout_ms = 0\n{MINIMAL}");
    assert_invalid(RelayConfig::from_toml_str(&text), "timeout_ms must be between")?;
    let text = format!("[process]\ntimeout_secs = 0\n{MINIMAL}");
    assert_invalid(RelayConfig::from_toml_str(&text), "process.timeout_secs must be > 0")
}

#[test]
fn rejects_blank_paths_and_channels() -> TestResult {
    let text = format!("[paths]\nsandbox_root = \" \"\n{MINIMAL}");
    assert_invalid(RelayConfig::from_toml_str(&text), "paths.sandbox_root must be non-empty")?;
    let text = format!("[chat]\ndefault_channel = \"#\"\n{MINIMAL}");
    assert_invalid(RelayConfig::from_toml_str(&text), "chat.default_channel must be non-empty")
}
