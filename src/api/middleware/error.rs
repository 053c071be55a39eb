//! Unified API error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::api::models::ErrorResponse;
use crate::error::DispatchError;

/// API-specific error type.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Invalid request parameters.
    BadRequest(String),
    /// Request conflicts with chain state (e.g. pruned block data).
    Conflict(String),
    /// A required backend (the notification transport) is not configured.
    ServiceUnavailable(String),
    /// Internal server error.
    InternalError(String),
    /// Rate limit exceeded.
    RateLimitExceeded,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "data_unavailable", msg),
            Self::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "transport_unavailable", msg)
            }
            Self::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limit_exceeded",
                "Rate limit exceeded. Please try again later.".to_string(),
            ),
            Self::InternalError(msg) => {
                error!(error = %msg, "Internal error in API handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        });

        (status, body).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::BlockNotFound { message } => Self::NotFound(message),
            DispatchError::InvalidCommand { message } => Self::BadRequest(message),
            DispatchError::DataUnavailable { message } => Self::Conflict(message),
            DispatchError::TransportUnavailable { message } => Self::ServiceUnavailable(message),
            DispatchError::ConfigError { .. } | DispatchError::InvariantViolation { .. } => {
                Self::InternalError(err.to_string())
            }
        }
    }
}
