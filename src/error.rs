use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Which tier of the failover chain produced (or failed to produce) a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailoverTier {
    Primary,
    StaleCache,
    AlternateSource,
    DegradedDefault,
}

impl std::fmt::Display for FailoverTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailoverTier::Primary => write!(f, "primary"),
            FailoverTier::StaleCache => write!(f, "stale_cache"),
            FailoverTier::AlternateSource => write!(f, "alternate_source"),
            FailoverTier::DegradedDefault => write!(f, "degraded_default"),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum RouteError {
    #[error("No path exists between the requested points under the given constraints")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Provider '{dependency}' unavailable after failover through {attempted}")]
    ProviderUnavailable {
        dependency: String,
        attempted: FailoverTier,
    },

    #[error("Provider '{0}' rate limited")]
    RateLimited(String),

    #[error("No viable continuation: {0}")]
    NoViableContinuation(String),

    #[error("Request deadline exceeded during stage '{stage}'")]
    Timeout { stage: &'static str },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Convert RouteError into HTTP responses
impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            RouteError::NotFound => (
                StatusCode::NOT_FOUND,
                "No route found for the given constraints".to_string(),
            ),
            RouteError::ConstraintViolation(ref e) => {
                (StatusCode::BAD_REQUEST, format!("Constraint violation: {}", e))
            }
            RouteError::ProviderUnavailable {
                ref dependency,
                attempted,
            } => {
                tracing::error!(
                    dependency = %dependency,
                    attempted = %attempted,
                    "Provider unavailable after full failover chain"
                );
                (StatusCode::BAD_GATEWAY, "Upstream data provider unavailable".to_string())
            }
            RouteError::RateLimited(ref dep) => {
                tracing::warn!(dependency = %dep, "Provider rate limited");
                (StatusCode::SERVICE_UNAVAILABLE, "Upstream provider rate limited".to_string())
            }
            RouteError::NoViableContinuation(ref e) => {
                tracing::info!("Multi-modal stitching dead-end: {}", e);
                (StatusCode::UNPROCESSABLE_ENTITY, e.clone())
            }
            RouteError::Timeout { stage } => {
                tracing::warn!(stage = stage, "Request deadline exceeded");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    format!("Route computation timed out during '{}'", stage),
                )
            }
            RouteError::InvalidRequest(ref e) => (StatusCode::BAD_REQUEST, e.clone()),
            RouteError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RouteError>;

/// Errors raised by a single provider call, before retry/failover policy.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Circuit open")]
    CircuitOpen,

    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Transient errors are retried; the rest fail straight to the failover chain.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Unavailable(_) | ProviderError::RateLimited)
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
