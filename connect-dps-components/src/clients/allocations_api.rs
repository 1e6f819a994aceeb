//! Client for the allocations API

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::error::ConnectDpsError;
use crate::types::{HmppsUser, StaffAllocationPolicies};

use super::{build_http_client, expect_success, AuthTokenProvider};

/// Access to the allocations API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AllocationsApi: Send + Sync {
    /// Job classifications of a staff member at their active
    /// establishment
    async fn get_staff_allocation_policies(
        &self,
        user: &HmppsUser,
    ) -> Result<StaffAllocationPolicies, ConnectDpsError>;
}

/// reqwest-backed [`AllocationsApi`] implementation
pub struct AllocationsApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn AuthTokenProvider>,
}

impl AllocationsApiClient {
    /// Create a client for the configured allocations API
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no base URL is configured or
    /// the HTTP client cannot be built.
    pub fn new(
        config: &ApiConfig,
        tokens: Arc<dyn AuthTokenProvider>,
    ) -> Result<Self, ConnectDpsError> {
        Ok(Self {
            http: build_http_client("allocations API", config)?,
            base_url: config.url.trim_end_matches('/').to_string(),
            tokens,
        })
    }
}

impl std::fmt::Debug for AllocationsApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationsApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AllocationsApi for AllocationsApiClient {
    async fn get_staff_allocation_policies(
        &self,
        user: &HmppsUser,
    ) -> Result<StaffAllocationPolicies, ConnectDpsError> {
        let case_load_id = user.active_case_load_id.as_deref().ok_or_else(|| {
            ConnectDpsError::Configuration(
                "an active case load is required to look up job classifications".to_string(),
            )
        })?;

        let system_token = self.tokens.system_token().await?;

        let response = self
            .http
            .get(format!(
                "{}/prisons/{case_load_id}/staff/{}/job-classifications",
                self.base_url, user.user_id
            ))
            .bearer_auth(system_token)
            .send()
            .await?;

        Ok(expect_success(response)?.json().await?)
    }
}
