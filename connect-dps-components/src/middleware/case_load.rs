//! Case-load cache middleware
//!
//! Ensures prison (NOMIS) users carry their case loads for the rest of
//! the request. Values come, in order of preference, from shared data
//! attached by the frontend components middleware, from the session
//! cache, and finally from the prison API. Shared data always wins over
//! the session so a stale cache is refreshed without an extra upstream
//! call.
//!
//! Unlike the components middleware this one is fail-closed: case-load
//! data can be a security-relevant precondition for later middleware,
//! so an upstream failure rejects the request instead of silently
//! continuing without the data.
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{middleware, routing::get, Router};
//! use connect_dps_components::config::ApiConfig;
//! use connect_dps_components::middleware::CaseLoadMiddleware;
//!
//! # fn example() -> anyhow::Result<()> {
//! let case_loads = CaseLoadMiddleware::new(&ApiConfig::new("https://prison-api.example"))?;
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "Hello" }))
//!     .layer(middleware::from_fn(move |req, next| {
//!         case_loads.clone().handle(req, next)
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

use crate::clients::{PrisonApi, PrisonApiClient};
use crate::config::ApiConfig;
use crate::error::ConnectDpsError;
use crate::session::Session;
use crate::types::{AuthSource, FrontendComponents, HmppsUser};

/// Middleware that caches and attaches the user's case loads
#[derive(Clone)]
pub struct CaseLoadMiddleware {
    client: Arc<dyn PrisonApi>,
}

impl std::fmt::Debug for CaseLoadMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseLoadMiddleware").finish_non_exhaustive()
    }
}

impl CaseLoadMiddleware {
    /// Create the middleware with a real prison API client
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the prison API is not
    /// configured correctly.
    pub fn new(config: &ApiConfig) -> Result<Self, ConnectDpsError> {
        Ok(Self::with_client(Arc::new(PrisonApiClient::new(config)?)))
    }

    /// Create the middleware around an existing [`PrisonApi`]
    /// implementation
    #[must_use]
    pub fn with_client(client: Arc<dyn PrisonApi>) -> Self {
        Self { client }
    }

    /// Middleware handler
    ///
    /// No-op for anonymous and non-NOMIS users. The shared-data refresh
    /// happens before the cache-miss check, which happens before the
    /// user is populated; later steps depend on the earlier writes.
    ///
    /// # Errors
    ///
    /// Returns [`CaseLoadMiddlewareError`] when no session is attached
    /// to the request (host misconfiguration) or the prison API call
    /// fails.
    pub async fn handle(
        self,
        mut request: Request,
        next: Next,
    ) -> Result<Response, CaseLoadMiddlewareError> {
        let Some(session) = request.extensions().get::<Session>().cloned() else {
            error!("user session required in order to cache case loads");
            return Err(CaseLoadMiddlewareError::MissingSession);
        };

        let Some(user) = request.extensions().get::<HmppsUser>().cloned() else {
            return Ok(next.run(request).await);
        };
        if user.token.is_empty() || user.auth_source != AuthSource::Nomis {
            return Ok(next.run(request).await);
        }

        if let Some(shared) = request
            .extensions()
            .get::<FrontendComponents>()
            .and_then(|components| components.shared_data.clone())
        {
            session.set_case_loads(shared.case_loads, shared.active_case_load);
        }

        if session.case_loads().is_none() {
            info!(
                username = %user.username,
                "falling back to the prison API to retrieve case loads"
            );
            let user_case_loads =
                self.client
                    .get_user_case_loads(&user.token)
                    .await
                    .map_err(|err| {
                        error!(
                            error = %err,
                            username = %user.username,
                            "failed to retrieve case loads"
                        );
                        CaseLoadMiddlewareError::Upstream(err)
                    })?;

            let case_loads: Vec<_> = user_case_loads
                .into_iter()
                .filter(|case_load| case_load.case_load_type != "APP")
                .collect();
            let active_case_load = case_loads
                .iter()
                .find(|case_load| case_load.currently_active)
                .cloned();

            session.set_case_loads(case_loads, active_case_load);
        }

        let mut user = user;
        user.case_loads = session.case_loads();
        user.active_case_load = session.active_case_load();
        user.active_case_load_id = session.active_case_load_id();
        request.extensions_mut().insert(user);

        Ok(next.run(request).await)
    }
}

/// Case-load middleware errors
#[derive(Debug, Error)]
pub enum CaseLoadMiddlewareError {
    /// No session attached to the request; the host's session layer must
    /// run before this middleware
    #[error("user session required in order to cache case loads")]
    MissingSession,

    /// The prison API call failed
    #[error(transparent)]
    Upstream(ConnectDpsError),
}

impl IntoResponse for CaseLoadMiddlewareError {
    fn into_response(self) -> Response {
        match self {
            Self::MissingSession => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "session support is not configured",
            )
                .into_response(),
            Self::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to retrieve case loads",
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockPrisonApi;
    use crate::types::{CaseLoad, SharedData};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::{middleware, Extension, Json, Router};
    use tower::ServiceExt;

    fn prison_user() -> HmppsUser {
        HmppsUser {
            token: "token".to_string(),
            auth_source: AuthSource::Nomis,
            username: "ESHANNON".to_string(),
            user_id: "487023".to_string(),
            display_name: "Edwin Shannon".to_string(),
            case_loads: None,
            active_case_load: None,
            active_case_load_id: None,
            allocation_job_responsibilities: None,
        }
    }

    fn case_load(id: &str, case_load_type: &str, active: bool) -> CaseLoad {
        CaseLoad {
            case_load_id: id.to_string(),
            description: format!("{id} (HMP)"),
            case_load_type: case_load_type.to_string(),
            caseload_function: "GENERAL".to_string(),
            currently_active: active,
        }
    }

    fn shared_data(case_loads: Vec<CaseLoad>, active: Option<CaseLoad>) -> SharedData {
        SharedData {
            case_loads,
            active_case_load: active,
            services: Vec::new(),
            allocation_job_responsibilities: None,
        }
    }

    async fn echo_user(Extension(user): Extension<HmppsUser>) -> Json<HmppsUser> {
        Json(user)
    }

    fn app(client: MockPrisonApi) -> Router {
        let mw = CaseLoadMiddleware::with_client(Arc::new(client));
        Router::new()
            .route("/", get(echo_user))
            .layer(middleware::from_fn(move |req, next| {
                mw.clone().handle(req, next)
            }))
    }

    async fn echoed_user(response: axum::response::Response) -> HmppsUser {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    struct RequestParts {
        session: Option<Session>,
        user: Option<HmppsUser>,
        shared_data: Option<SharedData>,
    }

    fn build_request(parts: RequestParts) -> Request<Body> {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        if let Some(session) = parts.session {
            request.extensions_mut().insert(session);
        }
        if let Some(user) = parts.user {
            request.extensions_mut().insert(user);
        }
        if let Some(shared) = parts.shared_data {
            request.extensions_mut().insert(FrontendComponents {
                header: String::new(),
                footer: String::new(),
                css_includes: Vec::new(),
                js_includes: Vec::new(),
                shared_data: Some(shared),
            });
        }
        request
    }

    #[tokio::test]
    async fn shared_data_refreshes_the_cache_without_calling_upstream() {
        let client = MockPrisonApi::new();
        let session = Session::default();
        let active = case_load("KMI", "INST", true);
        let case_loads = vec![active.clone(), case_load("LEI", "INST", false)];

        let request = build_request(RequestParts {
            session: Some(session.clone()),
            user: Some(prison_user()),
            shared_data: Some(shared_data(case_loads.clone(), Some(active.clone()))),
        });

        let response = app(client).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let user = echoed_user(response).await;
        assert_eq!(user.case_loads.as_deref(), Some(case_loads.as_slice()));
        assert_eq!(user.active_case_load, Some(active.clone()));
        assert_eq!(user.active_case_load_id.as_deref(), Some("KMI"));

        assert_eq!(session.case_loads(), Some(case_loads));
        assert_eq!(session.active_case_load(), Some(active));
        assert_eq!(session.active_case_load_id().as_deref(), Some("KMI"));
    }

    #[tokio::test]
    async fn shared_data_without_an_active_case_load_leaves_active_fields_unset() {
        let client = MockPrisonApi::new();
        let session = Session::default();
        let case_loads = vec![case_load("KMI", "INST", false)];

        let request = build_request(RequestParts {
            session: Some(session.clone()),
            user: Some(prison_user()),
            shared_data: Some(shared_data(case_loads.clone(), None)),
        });

        let response = app(client).oneshot(request).await.unwrap();

        let user = echoed_user(response).await;
        assert_eq!(user.case_loads, Some(case_loads));
        assert!(user.active_case_load.is_none());
        assert!(user.active_case_load_id.is_none());
        assert!(session.active_case_load().is_none());
    }

    #[tokio::test]
    async fn cached_session_data_short_circuits_the_upstream_call() {
        let client = MockPrisonApi::new();
        let session = Session::default();
        let active = case_load("KMI", "INST", true);
        session.set_case_loads(vec![active.clone()], Some(active.clone()));

        let request = build_request(RequestParts {
            session: Some(session),
            user: Some(prison_user()),
            shared_data: None,
        });

        let response = app(client).oneshot(request).await.unwrap();

        let user = echoed_user(response).await;
        assert_eq!(user.active_case_load, Some(active));
    }

    #[tokio::test]
    async fn cache_miss_fetches_filters_and_selects_the_active_case_load() {
        let mut client = MockPrisonApi::new();
        client
            .expect_get_user_case_loads()
            .withf(|token| token == "token")
            .returning(|_| {
                Ok(vec![
                    case_load("KMI", "INST", true),
                    case_load("LEI", "INST", false),
                    case_load("CADM", "APP", false),
                ])
            });

        let session = Session::default();
        let request = build_request(RequestParts {
            session: Some(session.clone()),
            user: Some(prison_user()),
            shared_data: None,
        });

        let response = app(client).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let user = echoed_user(response).await;
        let cached = user.case_loads.unwrap();
        assert_eq!(cached.len(), 2);
        assert!(cached.iter().all(|c| c.case_load_type != "APP"));
        assert_eq!(user.active_case_load_id.as_deref(), Some("KMI"));
        assert_eq!(session.active_case_load_id().as_deref(), Some("KMI"));
    }

    #[tokio::test]
    async fn missing_session_rejects_before_any_upstream_call() {
        // No expectation set: any client call would panic the test
        let client = MockPrisonApi::new();

        let request = build_request(RequestParts {
            session: None,
            user: Some(prison_user()),
            shared_data: None,
        });

        let response = app(client).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn non_nomis_users_are_a_no_op() {
        let client = MockPrisonApi::new();
        let session = Session::default();
        let mut user = prison_user();
        user.auth_source = AuthSource::Delius;

        let request = build_request(RequestParts {
            session: Some(session.clone()),
            user: Some(user),
            shared_data: None,
        });

        let response = app(client).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let user = echoed_user(response).await;
        assert!(user.case_loads.is_none());
        assert!(session.case_loads().is_none());
    }

    #[tokio::test]
    async fn anonymous_requests_pass_through() {
        let client = MockPrisonApi::new();

        // Handler must not require a user extension here
        let mw = CaseLoadMiddleware::with_client(Arc::new(client));
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(move |req, next| {
                mw.clone().handle(req, next)
            }));

        let request = build_request(RequestParts {
            session: Some(Session::default()),
            user: None,
            shared_data: None,
        });

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn upstream_failure_rejects_the_request() {
        let mut client = MockPrisonApi::new();
        client.expect_get_user_case_loads().returning(|_| {
            Err(ConnectDpsError::UpstreamStatus {
                status: StatusCode::BAD_GATEWAY,
                endpoint: "http://prison-api/api/users/me/caseloads".to_string(),
            })
        });

        let session = Session::default();
        let request = build_request(RequestParts {
            session: Some(session.clone()),
            user: Some(prison_user()),
            shared_data: None,
        });

        let response = app(client).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(session.case_loads().is_none());
    }
}
