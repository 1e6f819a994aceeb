//! connect-dps-components: shared frontend components middleware for
//! HMPPS digital services
//!
//! Prison and probation services share a common page header and footer,
//! served by a central frontend components API. This crate provides the
//! axum middleware those services plug into their router:
//!
//! - **Frontend components**: fetch the shared header/footer for the
//!   signed-in user, fall back to statically rendered markup when the
//!   API is unavailable or disabled, and widen the response's
//!   `Content-Security-Policy` header so the remote assets load.
//! - **Case loads**: cache the user's prison case loads in the session,
//!   refreshed from the component response's shared data or fetched from
//!   the prison API.
//! - **Allocation job responsibilities**: cache the user's allocation
//!   jobs (key worker, personal officer, ...) in the session, fetched
//!   from the allocations API when needed.
//!
//! # Error policy
//!
//! The components middleware is fail-open: a missing header is cosmetic,
//! so upstream failures degrade to fallback markup. The case-load and
//! allocation middleware are fail-closed: their data can be a
//! security-relevant precondition for later middleware, so upstream
//! failures reject the request. This asymmetry is deliberate.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{middleware, routing::get, Router};
//! use connect_dps_components::clients::AuthTokenProvider;
//! use connect_dps_components::config::{ApiConfig, FrontendComponentsConfig};
//! use connect_dps_components::prelude::*;
//!
//! # fn example(tokens: Arc<dyn AuthTokenProvider>) -> anyhow::Result<()> {
//! let components = FrontendComponentsMiddleware::new(
//!     FrontendComponentsConfig::new(
//!         ApiConfig::new("https://frontend-components.example"),
//!         "https://dps.example",
//!     ),
//!     Arc::clone(&tokens),
//! )?;
//! let case_loads = CaseLoadMiddleware::new(&ApiConfig::new("https://prison-api.example"))?;
//! let allocations = AllocationMiddleware::new(
//!     &ApiConfig::new("https://allocations-api.example"),
//!     tokens,
//! )?;
//!
//! // Layers run outermost-first, so the components middleware is added
//! // last: its shared data must be in place before the cache middleware
//! // run on the same request.
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "Hello" }))
//!     .layer(middleware::from_fn(move |req, next| {
//!         allocations.clone().handle(req, next)
//!     }))
//!     .layer(middleware::from_fn(move |req, next| {
//!         case_loads.clone().handle(req, next)
//!     }))
//!     .layer(middleware::from_fn(move |req, next| {
//!         components.clone().handle(req, next)
//!     }));
//! # Ok(())
//! # }
//! ```
//!
//! The host remains responsible for authentication (attaching an
//! [`HmppsUser`](types::HmppsUser) extension), for its session layer
//! (attaching a [`Session`](session::Session) extension), and for
//! rendering the [`FrontendComponents`](types::FrontendComponents)
//! extension into its pages.

pub mod clients;
pub mod config;
pub mod csp;
pub mod error;
mod fallback;
pub mod middleware;
pub mod observability;
pub mod session;
pub mod types;

pub mod prelude {
    //! Convenience re-exports for common types

    pub use crate::clients::AuthTokenProvider;
    pub use crate::config::{ApiConfig, EnvironmentName, FrontendComponentsConfig};
    pub use crate::error::ConnectDpsError;
    pub use crate::middleware::{
        AllocationMiddleware, CaseLoadMiddleware, FrontendComponentsMiddleware,
    };
    pub use crate::session::{Session, SessionData};
    pub use crate::types::{
        AllocationJobResponsibility, AuthSource, CaseLoad, FrontendComponents, HmppsUser,
        SharedData,
    };
}
