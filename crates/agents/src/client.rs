//! HTTP client for the agent service.
//!
//! Connection, timeout and bad-status failures all surface as
//! `OfficeError::ExternalService`, which the engine treats as recoverable:
//! the case is guaranteed untouched when a call fails.

use std::time::Duration;

use aioffice_core::{OfficeError, OfficeResult};

use crate::contracts::{OrchestrateRequest, OrchestrateResponse};

const SERVICE_NAME: &str = "ai_office_service";

/// Runs the full agent pipeline for a case.
pub trait OrchestrationClient {
    fn orchestrate(&self, request: &OrchestrateRequest) -> OfficeResult<OrchestrateResponse>;
}

/// Matches open items for a posted case.
pub trait MatchingClient {
    fn match_open_items(&self, request: &OrchestrateRequest) -> OfficeResult<OrchestrateResponse>;
}

/// Where the agent service lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://ai-office-service:8100".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Blocking reqwest client against the service's JSON API.
pub struct HttpAgentClient {
    config: ServiceConfig,
    client: reqwest::blocking::Client,
}

impl HttpAgentClient {
    pub fn new(config: ServiceConfig) -> OfficeResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OfficeError::external(SERVICE_NAME, e.to_string()))?;
        Ok(Self { config, client })
    }

    fn post(&self, path: &str, request: &OrchestrateRequest) -> OfficeResult<OrchestrateResponse> {
        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!(%url, request_id = %request.request_id, "calling agent service");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(|e| self.transport_error(&url, e))?;
        let response = response
            .error_for_status()
            .map_err(|e| OfficeError::external(SERVICE_NAME, e.to_string()))?;
        response
            .json::<OrchestrateResponse>()
            .map_err(|e| OfficeError::external(SERVICE_NAME, format!("invalid response: {e}")))
    }

    fn transport_error(&self, url: &str, error: reqwest::Error) -> OfficeError {
        if error.is_timeout() {
            OfficeError::external(SERVICE_NAME, "request timed out")
        } else if error.is_connect() {
            OfficeError::external(SERVICE_NAME, format!("cannot connect to {url}"))
        } else {
            OfficeError::external(SERVICE_NAME, error.to_string())
        }
    }
}

impl OrchestrationClient for HttpAgentClient {
    fn orchestrate(&self, request: &OrchestrateRequest) -> OfficeResult<OrchestrateResponse> {
        self.post("/v1/orchestrate", request)
    }
}

impl MatchingClient for HttpAgentClient {
    fn match_open_items(&self, request: &OrchestrateRequest) -> OfficeResult<OrchestrateResponse> {
        self.post("/v1/opos/match", request)
    }
}
