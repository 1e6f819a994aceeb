//! Allocation job responsibilities middleware
//!
//! Caches which allocation jobs (key worker, personal officer, ...) a
//! prison user is responsible for, following the same
//! shared-data-then-session-then-upstream chain as the case-load
//! middleware, and with the same fail-closed error policy.
//!
//! The allocations API is keyed by the user's active establishment, so
//! the case-load middleware must run earlier in the chain; a NOMIS user
//! reaching this middleware without an active case load is treated as a
//! wiring error, not a recoverable condition.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{middleware, routing::get, Router};
//! use connect_dps_components::clients::AuthTokenProvider;
//! use connect_dps_components::config::ApiConfig;
//! use connect_dps_components::middleware::AllocationMiddleware;
//!
//! # fn example(tokens: Arc<dyn AuthTokenProvider>) -> anyhow::Result<()> {
//! let allocations =
//!     AllocationMiddleware::new(&ApiConfig::new("https://allocations-api.example"), tokens)?;
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "Hello" }))
//!     .layer(middleware::from_fn(move |req, next| {
//!         allocations.clone().handle(req, next)
//!     }));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, info};

use crate::clients::{AllocationsApi, AllocationsApiClient, AuthTokenProvider};
use crate::config::ApiConfig;
use crate::error::ConnectDpsError;
use crate::session::Session;
use crate::types::{AuthSource, FrontendComponents, HmppsUser};

/// Middleware that caches and attaches the user's allocation job
/// responsibilities
#[derive(Clone)]
pub struct AllocationMiddleware {
    client: Arc<dyn AllocationsApi>,
}

impl std::fmt::Debug for AllocationMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationMiddleware").finish_non_exhaustive()
    }
}

impl AllocationMiddleware {
    /// Create the middleware with a real allocations API client
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no allocations API URL is
    /// configured, so a misconfigured host fails at startup rather than
    /// per request.
    pub fn new(
        config: &ApiConfig,
        tokens: Arc<dyn AuthTokenProvider>,
    ) -> Result<Self, ConnectDpsError> {
        Ok(Self::with_client(Arc::new(AllocationsApiClient::new(
            config, tokens,
        )?)))
    }

    /// Create the middleware around an existing [`AllocationsApi`]
    /// implementation
    #[must_use]
    pub fn with_client(client: Arc<dyn AllocationsApi>) -> Self {
        Self { client }
    }

    /// Middleware handler
    ///
    /// No-op for anonymous and non-NOMIS users.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationMiddlewareError`] when no session is attached
    /// to the request, when a NOMIS user has no active case load yet
    /// (case-load middleware not run), or the allocations API call
    /// fails.
    pub async fn handle(
        self,
        mut request: Request,
        next: Next,
    ) -> Result<Response, AllocationMiddlewareError> {
        let Some(session) = request.extensions().get::<Session>().cloned() else {
            error!("user session required in order to cache allocation job responsibilities");
            return Err(AllocationMiddlewareError::MissingSession);
        };

        let Some(user) = request.extensions().get::<HmppsUser>().cloned() else {
            return Ok(next.run(request).await);
        };
        if user.auth_source != AuthSource::Nomis {
            return Ok(next.run(request).await);
        }

        if user.active_case_load_id.is_none() {
            error!(
                username = %user.username,
                "case load details must be populated before retrieving allocation job responsibilities"
            );
            return Err(AllocationMiddlewareError::MissingCaseLoad);
        }

        if let Some(shared) = request
            .extensions()
            .get::<FrontendComponents>()
            .and_then(|components| components.shared_data.clone())
        {
            session.set_allocation_job_responsibilities(shared.allocation_job_responsibilities);
        }

        if session.allocation_job_responsibilities().is_none() {
            info!(
                username = %user.username,
                "falling back to the allocations API to retrieve job responsibilities"
            );
            let policies = self
                .client
                .get_staff_allocation_policies(&user)
                .await
                .map_err(|err| {
                    error!(
                        error = %err,
                        username = %user.username,
                        "failed to retrieve allocation job responsibilities"
                    );
                    AllocationMiddlewareError::Upstream(err)
                })?;

            session.set_allocation_job_responsibilities(Some(policies.policies));
        }

        let mut user = user;
        user.allocation_job_responsibilities = session.allocation_job_responsibilities();
        request.extensions_mut().insert(user);

        Ok(next.run(request).await)
    }
}

/// Allocation middleware errors
#[derive(Debug, Error)]
pub enum AllocationMiddlewareError {
    /// No session attached to the request; the host's session layer must
    /// run before this middleware
    #[error("user session required in order to cache allocation job responsibilities")]
    MissingSession,

    /// A NOMIS user has no active case load; the case-load middleware
    /// must run before this one
    #[error("case load details must be populated before retrieving allocation job responsibilities")]
    MissingCaseLoad,

    /// The allocations API call failed
    #[error(transparent)]
    Upstream(ConnectDpsError),
}

impl IntoResponse for AllocationMiddlewareError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingSession | Self::MissingCaseLoad => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "allocation middleware preconditions not met",
            )
                .into_response(),
            Self::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to retrieve allocation job responsibilities",
            )
                .into_response(),
        }
    }
}
