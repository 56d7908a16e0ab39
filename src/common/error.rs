//! Common Error Types for addrbatch
//!
//! Request-level failures. Per-address failures (including fan-out timeouts)
//! never surface here; they are carried as [`crate::aggregator::SlotError`]
//! next to the aggregated body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::indexer::IndexerError;

/// Root error type for the batch API
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// Body unparsable, `addresses` missing, or request over the size limit
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Indexer call failed for a whole-request operation
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Some but not all per-address calls failed
    #[error("{failed} of {total} address lookups failed")]
    PartialFailure { failed: usize, total: usize },

    /// Indexer refused a broadcast transaction
    #[error("broadcast rejected: {0}")]
    BroadcastRejected(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Internal errors
    #[error("internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AggregatorError {
    /// Create a malformed request error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AggregatorError::MalformedRequest(_) => "MALFORMED_REQUEST",
            AggregatorError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            AggregatorError::PartialFailure { .. } => "PARTIAL_FAILURE",
            AggregatorError::BroadcastRejected(_) => "BROADCAST_REJECTED",
            AggregatorError::Config(_) => "CONFIG_ERROR",
            AggregatorError::Logging(_) => "LOGGING_ERROR",
            AggregatorError::Internal(_) => "INTERNAL_ERROR",
            AggregatorError::Io(_) => "IO_ERROR",
        }
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AggregatorError::MalformedRequest(_) | AggregatorError::BroadcastRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            AggregatorError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            // Partial failures are reported inside a successful response
            AggregatorError::PartialFailure { .. } => StatusCode::OK,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IndexerError> for AggregatorError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::BroadcastRejected(msg) => AggregatorError::BroadcastRejected(msg),
            other => AggregatorError::UpstreamUnavailable(other.to_string()),
        }
    }
}

/// Error body returned to API clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AggregatorError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            code: self.error_code().to_string(),
            details: Some(self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AggregatorError
pub type Result<T> = std::result::Result<T, AggregatorError>;
