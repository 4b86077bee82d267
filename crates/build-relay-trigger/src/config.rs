// crates/build-relay-trigger/src/config.rs
// ============================================================================
// Module: Build Service Configuration
// Description: Connection settings for the build service.
// Purpose: Carry endpoint, credentials, and the real-builds switch.
// Dependencies: url
// ============================================================================

use std::time::Duration;

use url::Url;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default build service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://jenkins.internal";
/// Initiator label used when the requesting user is unknown.
pub const DEFAULT_INITIATOR: &str = "build-relay";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// SECTION: Config
// ============================================================================

/// Connection settings for the build service.
#[derive(Clone, PartialEq, Eq)]
pub struct BuildServiceConfig {
    /// Service root, e.g. `https://jenkins.internal`.
    pub base_url: Url,
    /// Basic-auth user.
    pub username: String,
    /// Basic-auth token.
    pub api_token: String,
    /// Start real builds when set; simulate them otherwise.
    pub real_builds: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `INITIATED_BY` value when the invocation has no initiator.
    pub default_initiator: String,
}

impl BuildServiceConfig {
    /// Creates a dry-run config for `base_url` with empty credentials.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            username: String::new(),
            api_token: String::new(),
            real_builds: false,
            timeout: DEFAULT_TIMEOUT,
            default_initiator: DEFAULT_INITIATOR.to_string(),
        }
    }

    /// Sets the basic-auth credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, api_token: impl Into<String>) -> Self {
        self.username = username.into();
        self.api_token = api_token.into();
        self
    }

    /// Enables or disables real builds.
    #[must_use]
    pub const fn with_real_builds(mut self, real_builds: bool) -> Self {
        self.real_builds = real_builds;
        self
    }
}

impl std::fmt::Debug for BuildServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildServiceConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("api_token", &"<redacted>")
            .field("real_builds", &self.real_builds)
            .field("timeout", &self.timeout)
            .field("default_initiator", &self.default_initiator)
            .finish()
    }
}
