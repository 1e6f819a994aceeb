//! Client for the prison API

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::error::ConnectDpsError;
use crate::types::CaseLoad;

use super::{build_http_client, expect_success};

/// Access to the prison API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrisonApi: Send + Sync {
    /// All case loads of the calling user
    async fn get_user_case_loads(&self, user_token: &str)
        -> Result<Vec<CaseLoad>, ConnectDpsError>;
}

/// reqwest-backed [`PrisonApi`] implementation
///
/// The caseloads endpoint is user-scoped, so calls are authenticated
/// with the user's own token rather than a system token.
#[derive(Debug)]
pub struct PrisonApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl PrisonApiClient {
    /// Create a client for the configured prison API
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no base URL is configured or
    /// the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ConnectDpsError> {
        Ok(Self {
            http: build_http_client("prison API", config)?,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PrisonApi for PrisonApiClient {
    async fn get_user_case_loads(
        &self,
        user_token: &str,
    ) -> Result<Vec<CaseLoad>, ConnectDpsError> {
        let response = self
            .http
            .get(format!("{}/api/users/me/caseloads", self.base_url))
            .query(&[("allCaseloads", "true")])
            .bearer_auth(user_token)
            .send()
            .await?;

        Ok(expect_success(response)?.json().await?)
    }
}
