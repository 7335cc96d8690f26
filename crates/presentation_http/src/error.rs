//! API error handling
//!
//! Every terminal pipeline outcome other than a forwarded response or a drop
//! becomes an `ApiError` rendered as a small JSON body.

use application::{ApplicationError, Rejection};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited {
        /// Window limit
        limit: u32,
        /// Requests counted in the window
        used: u32,
    },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// HTTP status for this error
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message, details) = match self {
            Self::BadRequest(msg) => ("bad_request", msg, None),
            Self::Unauthorized(msg) => ("unauthorized", msg, None),
            Self::NotFound(msg) => ("not_found", msg, None),
            Self::RateLimited { limit, used } => (
                "rate_limited",
                "Rate limit exceeded".to_string(),
                Some(format!("{used} of {limit} requests used in the current window")),
            ),
            Self::ServiceUnavailable(msg) => ("service_unavailable", msg, None),
            Self::BadGateway(msg) => (
                "bad_gateway",
                "Upstream request failed".to_string(),
                Some(msg),
            ),
            Self::Internal(msg) => (
                "internal_error",
                "An internal error occurred".to_string(),
                Some(msg),
            ),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::MissingTenant => Self::Unauthorized("Tenant not found".to_string()),
            Rejection::RateLimited { limit, used } => Self::RateLimited { limit, used },
            Rejection::ServiceUnavailable => {
                Self::ServiceUnavailable("Service temporarily unavailable".to_string())
            },
            Rejection::CounterStoreUnavailable => {
                Self::ServiceUnavailable("Counter store unavailable".to_string())
            },
            Rejection::RouteNotFound => Self::NotFound("Route not found".to_string()),
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Domain(e) => Self::BadRequest(e.to_string()),
            ApplicationError::CounterStore(msg) => Self::ServiceUnavailable(msg),
            ApplicationError::Configuration(msg) | ApplicationError::Internal(msg) => {
                Self::Internal(msg)
            },
        }
    }
}
