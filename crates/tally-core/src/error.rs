//! Error types shared across the billing client and the engine.

use thiserror::Error;

/// Result type alias using [`ApiError`].
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the remote billing/directory collaborators.
///
/// Transient conditions (429, 5xx, network hiccups) are retried inside the
/// transport and never reach callers; what does reach callers is either a
/// terminal API response ([`ApiError::Api`]) or a local failure.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Client-side configuration problem (bad base URL, missing token, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP transport error after retries were exhausted.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-2xx API response that is not retried.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The budgets endpoint responded 404: the feature is not enabled for
    /// this enterprise. Callers must stop issuing budget calls for the rest
    /// of the run.
    #[error("budgets API unavailable: {0}")]
    BudgetsUnavailable(String),
}

impl ApiError {
    /// HTTP status of a terminal API response, if that is what this is.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a 409 Conflict response (cost-center name collision).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}
