//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;
use crate::models::ValidationError;

/// Seconds a client should wait before retrying after pool exhaustion
const RETRY_AFTER_SECS: &str = "1";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (422)
    Validation(ValidationError),

    /// Pool exhausted, closed or unable to connect (503), otherwise 500 and logged
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::Database(DbError::PoolExhausted) => {
                tracing::warn!("Rejecting request: connection pool exhausted");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": "pool_exhausted",
                        "message": "no database connection available, retry later"
                    }),
                )
            }
            Self::Database(DbError::PoolClosed) => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": "unavailable",
                    "message": "service is shutting down"
                }),
            ),
            Self::Database(DbError::Connectivity(reason)) => {
                tracing::error!("Database unreachable: {}", reason);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": "database_unavailable",
                        "message": "the database cannot be reached"
                    }),
                )
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::Database(DbError::PoolExhausted)) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(DbError::from(e))
    }
}
