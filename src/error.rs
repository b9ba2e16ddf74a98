//! Service error types with HTTP status code mapping.
//!
//! [`SentinelError`] is what user-initiated operations return. Boundary
//! errors ([`ExtractionError`], [`StorageError`]) convert into it with `?`.
//! Background checks never surface it; they turn failures into activity
//! entries and retry on the next tick.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::gateway::ExtractionError;
use crate::persistence::StorageError;

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: target_price must be positive",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Service error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status               |
/// |-----------|----------------------|---------------------------|
/// | 1000–1999 | Validation           | 400 Bad Request           |
/// | 2000–2999 | Not Found            | 404 Not Found             |
/// | 3000–3999 | Server               | 500 Internal Server Error |
/// | 5000–5999 | Upstream extraction  | 502 Bad Gateway / 504     |
#[derive(Debug, thiserror::Error)]
pub enum SentinelError {
    /// Product with the given ID was not found.
    #[error("product not found: {0}")]
    ProductNotFound(uuid::Uuid),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The extraction service could not produce usable data.
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Snapshot store failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] StorageError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SentinelError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::ProductNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Extraction(ExtractionError::Timeout { .. }) => 5002,
            Self::Extraction(ExtractionError::InvalidPrice(_)) => 5003,
            Self::Extraction(_) => 5001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ProductNotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Extraction(ExtractionError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Extraction(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for SentinelError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
