//! Thin REST clients for the upstream HMPPS APIs
//!
//! One client per API, each behind a trait so the middleware can be
//! exercised against mocks. Clients hold a reusable [`reqwest::Client`]
//! configured with the API's timeout; they make exactly one attempt per
//! call and map any transport failure or non-success status to
//! [`ConnectDpsError`] without interpreting individual status codes.

mod allocations_api;
mod component_api;
mod prison_api;

pub use allocations_api::{AllocationsApi, AllocationsApiClient};
pub use component_api::{ComponentApi, ComponentApiClient};
pub use prison_api::{PrisonApi, PrisonApiClient};

#[cfg(test)]
pub(crate) use allocations_api::MockAllocationsApi;
#[cfg(test)]
pub(crate) use component_api::MockComponentApi;
#[cfg(test)]
pub(crate) use prison_api::MockPrisonApi;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::error::ConnectDpsError;

/// Source of system (client-credentials) tokens for service-to-service
/// calls
///
/// Token acquisition is owned by the host application; this crate only
/// consumes the capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthTokenProvider: Send + Sync {
    /// A valid system token for the calling service
    async fn system_token(&self) -> Result<String, ConnectDpsError>;
}

/// Build the HTTP client for an upstream API, validating its
/// configuration
///
/// Fails fast with a configuration error when the base URL is missing,
/// so a misconfigured host is caught at integration time rather than on
/// the first request.
pub(crate) fn build_http_client(
    api_name: &str,
    config: &ApiConfig,
) -> Result<reqwest::Client, ConnectDpsError> {
    if config.url.trim().is_empty() {
        return Err(ConnectDpsError::Configuration(format!(
            "a {api_name} URL must be configured"
        )));
    }

    reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
        .map_err(|err| {
            ConnectDpsError::Configuration(format!(
                "failed to build the {api_name} HTTP client: {err}"
            ))
        })
}

/// Reject non-success responses before attempting to decode them
pub(crate) fn expect_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ConnectDpsError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ConnectDpsError::UpstreamStatus {
            status,
            endpoint: response.url().to_string(),
        })
    }
}
