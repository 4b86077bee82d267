// crates/build-relay-trigger/src/client.rs
// ============================================================================
// Module: Build Service Client
// Description: HTTP client that starts parameterized pipeline builds.
// Purpose: Issue one authenticated form POST per trigger request.
// Dependencies: reqwest, url
// ============================================================================

//! ## Overview
//! [`BuildService`] is the seam between the trigger and the network.
//! [`HttpBuildService`] posts `GIT_REF`, `EXPIRE_CACHE`, and `INITIATED_BY` as
//! a form body with basic auth. Redirects are not followed and any non-success
//! status fails the request. Requests are never retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use url::Url;
use url::form_urlencoded;

use crate::config::BuildServiceConfig;
use crate::trigger::BuildTriggerRequest;
use crate::trigger::TriggerError;

// ============================================================================
// SECTION: Service Contract
// ============================================================================

/// Starts builds on a build service.
pub trait BuildService: Send + Sync {
    /// Starts the pipeline described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError`] when the service cannot be reached or rejects
    /// the request.
    fn start(&self, request: &BuildTriggerRequest) -> Result<(), TriggerError>;
}

// ============================================================================
// SECTION: HTTP Service
// ============================================================================

/// Build service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBuildService {
    /// HTTP client used for trigger requests.
    client: Client,
    /// Service root.
    base_url: Url,
    /// Basic-auth user.
    username: String,
    /// Basic-auth token.
    api_token: String,
}

impl HttpBuildService {
    /// Builds a service client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::Client`] when the HTTP client cannot be built.
    pub fn new(config: &BuildServiceConfig) -> Result<Self, TriggerError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(config.timeout)
            .build()
            .map_err(|err| TriggerError::Client(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Returns the trigger endpoint for `pipeline`.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidUrl`] when the base URL cannot carry a
    /// path.
    pub fn endpoint(&self, pipeline: &str) -> Result<Url, TriggerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TriggerError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["job", pipeline, "buildWithParameters"]);
        Ok(url)
    }
}

impl BuildService for HttpBuildService {
    fn start(&self, request: &BuildTriggerRequest) -> Result<(), TriggerError> {
        let url = self.endpoint(&request.pipeline)?;
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("GIT_REF", &request.git_ref)
            .append_pair("EXPIRE_CACHE", "false")
            .append_pair("INITIATED_BY", &request.initiator)
            .finish();
        let response = self
            .client
            .post(url.as_str())
            .basic_auth(&self.username, Some(&self.api_token))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .map_err(|err| TriggerError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TriggerError::Status(status.as_u16()));
        }
        Ok(())
    }
}
