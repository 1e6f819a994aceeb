//! Error types

use thiserror::Error;

/// Library error type
///
/// `Configuration` failures are raised at construction time and are meant
/// to fail fast at integration time; the upstream variants are raised per
/// request and handled according to each middleware's error policy.
#[derive(Debug, Error)]
pub enum ConnectDpsError {
    /// Required setup is missing or invalid
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure calling an upstream API
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// An upstream API answered with a non-success status
    #[error("upstream returned {status} from {endpoint}")]
    UpstreamStatus {
        /// Response status code
        status: http::StatusCode,
        /// The endpoint that answered
        endpoint: String,
    },

    /// Fallback template rendering failed
    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}
