//! Configuration records for the middleware constructors
//!
//! Each middleware takes one configuration record; hosts typically
//! deserialize these from their own configuration files or environment
//! layers. All fields beyond the upstream base URLs have sensible
//! defaults.

use serde::{Deserialize, Serialize};

/// Connection details for one upstream API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the API, without a trailing slash
    pub url: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_ms: 5000,
        }
    }
}

impl ApiConfig {
    /// Convenience constructor for hosts configuring in code
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Deployment environment shown in the fallback header banner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentName {
    /// Development
    #[serde(rename = "DEV")]
    Dev,
    /// Pre-production
    #[serde(rename = "PRE-PRODUCTION")]
    PreProduction,
    /// Production
    #[serde(rename = "PRODUCTION")]
    Production,
}

impl std::fmt::Display for EnvironmentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Dev => "DEV",
            Self::PreProduction => "PRE-PRODUCTION",
            Self::Production => "PRODUCTION",
        };
        write!(f, "{name}")
    }
}

/// Configuration for the frontend components middleware
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendComponentsConfig {
    /// The frontend components API
    pub component_api: ApiConfig,

    /// Base URL of the Digital Prison Services frontend, linked from the
    /// fallback header for prison users
    pub dps_url: String,

    /// Base URL of the auth service, linked from the fallback header and
    /// footer for external users
    #[serde(default)]
    pub auth_url: Option<String>,

    /// Feedback and support URL shown in the fallback footer
    #[serde(default)]
    pub support_url: Option<String>,

    /// Environment banner rendered in the fallback header
    #[serde(default)]
    pub environment_name: Option<EnvironmentName>,

    /// Expose the upstream shared metadata to later middleware via
    /// [`FrontendComponents::shared_data`](crate::types::FrontendComponents)
    #[serde(default)]
    pub include_shared_data: bool,

    /// Never call the components API; always render fallbacks. For
    /// environments where the remote component service is unreachable.
    #[serde(default)]
    pub use_fallbacks_by_default: bool,

    /// Also authorize the Application Insights telemetry domains in the
    /// `connect-src` CSP directive
    #[serde(default)]
    pub application_insights_csp: bool,
}

impl FrontendComponentsConfig {
    /// Minimal configuration: components API plus the DPS frontend URL
    pub fn new(component_api: ApiConfig, dps_url: impl Into<String>) -> Self {
        Self {
            component_api,
            dps_url: dps_url.into(),
            auth_url: None,
            support_url: None,
            environment_name: None,
            include_shared_data: false,
            use_fallbacks_by_default: false,
            application_insights_csp: false,
        }
    }
}
