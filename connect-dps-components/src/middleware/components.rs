//! Frontend components middleware
//!
//! Fetches the shared header and footer from the components API for the
//! signed-in user, exposes them to downstream handlers as a
//! [`FrontendComponents`] request extension, and widens the response's
//! `Content-Security-Policy` header to authorize the components host.
//!
//! This middleware is fail-open: when there is no user in context, when
//! fallbacks are forced by configuration, or when the upstream call
//! fails, it substitutes statically rendered fallback markup and the
//! request continues normally. A missing header is cosmetic; the
//! session-cache middleware in this crate handle their data with the
//! opposite, fail-closed policy.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::{middleware, routing::get, Router};
//! use connect_dps_components::clients::AuthTokenProvider;
//! use connect_dps_components::config::{ApiConfig, FrontendComponentsConfig};
//! use connect_dps_components::middleware::FrontendComponentsMiddleware;
//!
//! # fn example(tokens: Arc<dyn AuthTokenProvider>) -> anyhow::Result<()> {
//! let config = FrontendComponentsConfig::new(
//!     ApiConfig::new("https://frontend-components.example"),
//!     "https://dps.example",
//! );
//! let components = FrontendComponentsMiddleware::new(config, tokens)?;
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "Hello" }))
//!     .layer(middleware::from_fn(move |req, next| {
//!         components.clone().handle(req, next)
//!     }));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{error, info};

use crate::clients::{AuthTokenProvider, ComponentApi, ComponentApiClient};
use crate::config::FrontendComponentsConfig;
use crate::csp;
use crate::error::ConnectDpsError;
use crate::fallback::{fallback_footer, fallback_header};
use crate::types::{ComponentsResponse, FrontendComponents, HmppsUser};

/// Middleware that attaches the shared header and footer to each request
#[derive(Clone)]
pub struct FrontendComponentsMiddleware {
    client: Arc<dyn ComponentApi>,
    config: Arc<FrontendComponentsConfig>,
}

impl std::fmt::Debug for FrontendComponentsMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontendComponentsMiddleware")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FrontendComponentsMiddleware {
    /// Create the middleware with a real components API client
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the components API is not
    /// configured correctly.
    pub fn new(
        config: FrontendComponentsConfig,
        tokens: Arc<dyn AuthTokenProvider>,
    ) -> Result<Self, ConnectDpsError> {
        let client = ComponentApiClient::new(&config.component_api, tokens)?;
        Ok(Self::with_client(Arc::new(client), config))
    }

    /// Create the middleware around an existing [`ComponentApi`]
    /// implementation
    #[must_use]
    pub fn with_client(client: Arc<dyn ComponentApi>, config: FrontendComponentsConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Middleware handler
    ///
    /// Inserts a [`FrontendComponents`] extension on every request; the
    /// CSP header is patched only when the upstream call succeeded,
    /// since fallback markup references no remote assets.
    pub async fn handle(self, mut request: Request, next: Next) -> Response {
        let Some(user) = request.extensions().get::<HmppsUser>().cloned() else {
            info!("using fallback frontend components when no user in context");
            request.extensions_mut().insert(self.fallback_components(None));
            return next.run(request).await;
        };

        if self.config.use_fallbacks_by_default {
            info!("using fallback frontend components by default");
            request
                .extensions_mut()
                .insert(self.fallback_components(Some(&user)));
            return next.run(request).await;
        }

        match self.client.get_components(&user.token).await {
            Ok(components) => {
                request.extensions_mut().insert(self.assemble(components));

                let mut response = next.run(request).await;
                csp::apply_components_csp(
                    response.headers_mut(),
                    &self.config.component_api.url,
                    self.config.application_insights_csp,
                );
                response
            }
            Err(err) => {
                error!(error = %err, "failed to retrieve frontend components, using fallbacks");
                request
                    .extensions_mut()
                    .insert(self.fallback_components(Some(&user)));
                next.run(request).await
            }
        }
    }

    fn assemble(&self, response: ComponentsResponse) -> FrontendComponents {
        let ComponentsResponse { header, footer, meta } = response;

        FrontendComponents {
            header: header.html,
            footer: footer.html,
            css_includes: header.css.into_iter().chain(footer.css).collect(),
            js_includes: header
                .javascript
                .into_iter()
                .chain(footer.javascript)
                .collect(),
            shared_data: if self.config.include_shared_data {
                meta
            } else {
                None
            },
        }
    }

    fn fallback_components(&self, user: Option<&HmppsUser>) -> FrontendComponents {
        FrontendComponents {
            header: fallback_header(user, &self.config),
            footer: fallback_footer(user, &self.config),
            css_includes: Vec::new(),
            js_includes: Vec::new(),
            shared_data: None,
        }
    }
}
