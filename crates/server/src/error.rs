//! Unified error handling with Sentry integration.
//!
//! Provides a unified `ApiError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, ApiError>`. The wire shape is `{ "message", "statusCode" }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use pronto_core::CoordinateError;

use crate::db::RepositoryError;
use crate::services::cart::CartError;
use crate::services::orders::OrderError;

/// Application-level error type for the marketplace API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body or a query parameter could not be interpreted.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// The cart violated a business constraint.
    #[error("validation failure: {0}")]
    Validation(String),

    /// The starting merchant is outside the delivery radius.
    #[error("range violation: {0}")]
    OutOfRange(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller identity missing or invalid.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The wire form of an error.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(rename = "statusCode")]
    status_code: u16,
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Malformed(_) | Self::Validation(_) | Self::OutOfRange(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the client. Internal details stay server-side.
    fn client_message(&self) -> String {
        match self {
            Self::Malformed(msg)
            | Self::Validation(msg)
            | Self::OutOfRange(msg)
            | Self::NotFound(msg)
            | Self::Unauthorized(msg) => msg.clone(),
            Self::Database(_) | Self::Internal(_) => "internal server error".to_owned(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = ErrorBody {
            message: self.client_message(),
            status_code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoordinateError> for ApiError {
    fn from(_: CoordinateError) -> Self {
        Self::Malformed("coordinate is not valid".to_owned())
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::StartingPoint => Self::Validation(err.to_string()),
            CartError::MerchantNotFound(_) | CartError::ItemNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            CartError::OutOfRange(_) => Self::OutOfRange(err.to_string()),
            CartError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EstimateNotFound => Self::NotFound(err.to_string()),
            OrderError::Repository(e) => Self::Database(e),
        }
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;
