// crates/build-relay-config/src/config.rs
// ============================================================================
// Module: Build Relay Configuration
// Description: Configuration loading and validation for Build Relay.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: build-relay-core, build-relay-trigger, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, then `BUILD_RELAY_CONFIG`, then
//! `build-relay.toml` in the working directory. Missing or invalid
//! configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use build_relay_core::EngineSettings;
use build_relay_core::ProcessRunner;
use build_relay_core::Project;
use build_relay_core::ProjectCatalog;
use build_relay_trigger::BuildServiceConfig;
use build_relay_trigger::DEFAULT_BASE_URL;
use build_relay_trigger::DEFAULT_INITIATOR;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "build-relay.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "BUILD_RELAY_CONFIG";
/// Environment variable exposing the cache root to child processes.
pub const CACHE_ROOT_ENV_VAR: &str = "BUILD_RELAY_CACHE_ROOT";
/// Maximum size of the config file in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of a full path.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of configured projects.
const MAX_PROJECTS: usize = 512;
/// Maximum build service request timeout in milliseconds.
const MAX_TIMEOUT_MS: u64 = 120_000;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Root configuration for the relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    /// Build service connection.
    #[serde(default)]
    pub build_service: BuildServiceSection,
    /// Chat routing settings.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Filesystem locations.
    #[serde(default)]
    pub paths: PathsConfig,
    /// External process limits.
    #[serde(default)]
    pub process: ProcessConfig,
    /// Projects keyed by the name used as the `PROJECT` token.
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectConfig>,
}

/// `[build_service]` table.
#[derive(Clone, Deserialize)]
pub struct BuildServiceSection {
    /// Service root URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Basic-auth user.
    #[serde(default)]
    pub username: String,
    /// Basic-auth token.
    #[serde(default)]
    pub api_token: String,
    /// Start real builds; dry-run otherwise.
    #[serde(default)]
    pub real_builds: bool,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Initiator label for invocations without a requesting user.
    #[serde(default = "default_initiator")]
    pub default_initiator: String,
}

impl Default for BuildServiceSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: String::new(),
            api_token: String::new(),
            real_builds: false,
            timeout_ms: default_timeout_ms(),
            default_initiator: default_initiator(),
        }
    }
}

impl std::fmt::Debug for BuildServiceSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildServiceSection")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .field("real_builds", &self.real_builds)
            .field("timeout_ms", &self.timeout_ms)
            .field("default_initiator", &self.default_initiator)
            .finish()
    }
}

impl BuildServiceSection {
    /// Validates the build service table.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(self.base_url.trim()).map_err(|err| {
            ConfigError::Invalid(format!("build_service.base_url is not a url: {err}"))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(
                "build_service.base_url must include http:// or https://".to_string(),
            ));
        }
        if url.cannot_be_a_base() {
            return Err(ConfigError::Invalid(
                "build_service.base_url must be a base url".to_string(),
            ));
        }
        if self.real_builds {
            if self.username.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "build_service.username must be set when real_builds is enabled".to_string(),
                ));
            }
            if self.api_token.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "build_service.api_token must be set when real_builds is enabled".to_string(),
                ));
            }
        }
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "build_service.timeout_ms must be between 1 and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.default_initiator.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "build_service.default_initiator must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[chat]` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatConfig {
    /// Channel used when a project declares no inform channel.
    #[serde(default)]
    pub default_channel: Option<String>,
    /// Deliver `debug` output to direct replies.
    #[serde(default)]
    pub debug_private_messages: bool,
}

impl ChatConfig {
    /// Validates the chat table.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(channel) = &self.default_channel {
            validate_channel("chat.default_channel", channel)?;
        }
        Ok(())
    }
}

/// `[paths]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Shared cache directory exposed to child processes.
    #[serde(default = "default_cache_root")]
    pub cache_root: PathBuf,
    /// Parent directory of per-invocation sandboxes.
    #[serde(default = "default_sandbox_root")]
    pub sandbox_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_root: default_cache_root(),
            sandbox_root: default_sandbox_root(),
        }
    }
}

impl PathsConfig {
    /// Validates the paths table.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("paths.cache_root", &self.cache_root.to_string_lossy())?;
        validate_path_string("paths.sandbox_root", &self.sandbox_root.to_string_lossy())?;
        Ok(())
    }
}

/// `[process]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessConfig {
    /// Timeout applied to external processes, in seconds.
    #[serde(default = "default_process_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_process_timeout_secs(),
        }
    }
}

impl ProcessConfig {
    /// Validates the process table.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("process.timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }
}

/// `[projects.NAME]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Build service pipeline started by `build`.
    pub pipeline: String,
    /// Channel for this project's announcements.
    #[serde(default)]
    pub inform_channel: Option<String>,
    /// Ref built when `build` is given no ref.
    #[serde(default = "default_ref")]
    pub default_ref: String,
    /// Command run in the sandbox before triggering a build.
    #[serde(default)]
    pub prepare_command: Option<Vec<String>>,
}

impl ProjectConfig {
    /// Validates one project table.
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "project name '{name}' must be non-empty and contain no whitespace"
            )));
        }
        if self.pipeline.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("projects.{name}.pipeline must be set")));
        }
        if let Some(channel) = &self.inform_channel {
            validate_channel(&format!("projects.{name}.inform_channel"), channel)?;
        }
        if self.default_ref.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "projects.{name}.default_ref must be non-empty"
            )));
        }
        if let Some(command) = &self.prepare_command
            && command.first().is_none_or(|program| program.trim().is_empty())
        {
            return Err(ConfigError::Invalid(format!(
                "projects.{name}.prepare_command must name a program"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl RelayConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_service.validate()?;
        self.chat.validate()?;
        self.paths.validate()?;
        self.process.validate()?;
        if self.projects.is_empty() {
            return Err(ConfigError::Invalid("at least one project must be configured".to_string()));
        }
        if self.projects.len() > MAX_PROJECTS {
            return Err(ConfigError::Invalid(format!(
                "too many projects (max {MAX_PROJECTS})"
            )));
        }
        for (name, project) in &self.projects {
            project.validate(name)?;
        }
        Ok(())
    }

    /// Returns the project named `name`.
    #[must_use]
    pub fn project(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects.get(name)
    }
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

impl RelayConfig {
    /// Returns the settings consumed by the dispatch engine.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        let mut settings = EngineSettings::new(self.paths.sandbox_root.clone());
        settings.default_channel.clone_from(&self.chat.default_channel);
        settings.debug_private_messages = self.chat.debug_private_messages;
        settings
    }

    /// Returns the engine's view of the configured projects.
    #[must_use]
    pub fn project_catalog(&self) -> ProjectCatalog {
        ProjectCatalog::new(self.projects.iter().map(|(name, project)| {
            let entry = Project::new(name.clone());
            match &project.inform_channel {
                Some(channel) => entry.with_inform_channel(channel.clone()),
                None => entry,
            }
        }))
    }

    /// Returns the build service connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the base URL does not parse.
    pub fn build_service_config(&self) -> Result<BuildServiceConfig, ConfigError> {
        let section = &self.build_service;
        let base_url = Url::parse(section.base_url.trim()).map_err(|err| {
            ConfigError::Invalid(format!("build_service.base_url is not a url: {err}"))
        })?;
        let mut config = BuildServiceConfig::new(base_url)
            .with_credentials(section.username.clone(), section.api_token.clone())
            .with_real_builds(section.real_builds);
        config.timeout = Duration::from_millis(section.timeout_ms);
        config.default_initiator.clone_from(&section.default_initiator);
        Ok(config)
    }

    /// Returns the process runner with the configured timeout and cache root.
    #[must_use]
    pub fn process_runner(&self) -> ProcessRunner {
        ProcessRunner::new(Duration::from_secs(self.process.timeout_secs))
            .with_env(CACHE_ROOT_ENV_VAR, self.paths.cache_root.as_os_str())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    if path.to_string_lossy().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a channel name.
fn validate_channel(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().trim_start_matches('#').is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default build service URL.
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Default request timeout in milliseconds.
const fn default_timeout_ms() -> u64 {
    10_000
}

/// Default initiator label.
fn default_initiator() -> String {
    DEFAULT_INITIATOR.to_string()
}

/// Default cache directory.
fn default_cache_root() -> PathBuf {
    env::temp_dir().join("build-relay").join("cache")
}

/// Default sandbox parent directory.
fn default_sandbox_root() -> PathBuf {
    env::temp_dir().join("build-relay").join("sandboxes")
}

/// Default external process timeout in seconds.
const fn default_process_timeout_secs() -> u64 {
    60 * 60
}

/// Default git ref.
fn default_ref() -> String {
    "main".to_string()
}
