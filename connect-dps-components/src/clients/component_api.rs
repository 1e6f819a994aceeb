//! Client for the frontend components API

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::error::ConnectDpsError;
use crate::types::ComponentsResponse;

use super::{build_http_client, expect_success, AuthTokenProvider};

/// Access to the frontend components API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComponentApi: Send + Sync {
    /// Fetch the shared header and footer for the given user
    async fn get_components(&self, user_token: &str) -> Result<ComponentsResponse, ConnectDpsError>;
}

/// reqwest-backed [`ComponentApi`] implementation
///
/// Calls are authenticated with a system token; the user's own token is
/// forwarded in the `x-user-token` header so the API can personalize the
/// header for the signed-in user.
pub struct ComponentApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn AuthTokenProvider>,
}

impl ComponentApiClient {
    /// Create a client for the configured components API
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
            http: build_http_client("components API", config)?,
            base_url: config.url.trim_end_matches('/').to_string(),
            tokens,
        })
    }
}

impl std::fmt::Debug for ComponentApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ComponentApi for ComponentApiClient {
    async fn get_components(
        &self,
        user_token: &str,
    ) -> Result<ComponentsResponse, ConnectDpsError> {
        let system_token = self.tokens.system_token().await?;

        let response = self
            .http
            .get(format!("{}/components", self.base_url))
            .query(&[("component", "header"), ("component", "footer")])
            .bearer_auth(system_token)
            .header("x-user-token", user_token)
            .send()
            .await?;

        Ok(expect_success(response)?.json().await?)
    }
}
