//! Error Handling Module
//!
//! Maps domain errors to HTTP status codes via a single `ApiError`
//! enum. Validation failures carry a field-scoped detail; storage and
//! integrity failures are logged with `tracing` and surface to clients
//! as generic messages with no internals.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{PricingError, TrailError};

#[derive(Debug, Error)]
pub enum ApiError {
    // ============ 400 Bad Request ============
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ============ 404 Not Found ============
    #[error("Resource not found: {0}")]
    NotFound(String),

    // ============ 409 Conflict ============
    #[error("Already completed: {0}")]
    AlreadyCompleted(String),

    // ============ 500 Internal Server Error ============
    /// Missing catalog data for a reachable stage/day. Should never
    /// happen with a correctly seeded catalog; fatal for the request.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    InternalError,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            ApiError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(msg.clone()),
            ),
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found", resource),
                None,
            ),
            ApiError::AlreadyCompleted(msg) => (
                StatusCode::CONFLICT,
                "ALREADY_COMPLETED",
                msg.clone(),
                None,
            ),
            ApiError::DataIntegrity(_) => {
                // Catalog holes are an operator problem, not a client one.
                tracing::error!("Data integrity error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATA_INTEGRITY_ERROR",
                    "An internal data error occurred".to_string(),
                    None,
                )
            }
            ApiError::DatabaseError(_) => {
                tracing::error!("Database error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database error occurred".to_string(),
                    None,
                )
            }
            ApiError::InternalError => {
                tracing::error!("Internal error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("SQLx error: {:?}", err);
        ApiError::DatabaseError(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Anyhow error: {:?}", err);
        ApiError::InternalError
    }
}

impl From<PricingError> for ApiError {
    fn from(err: PricingError) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<TrailError> for ApiError {
    fn from(err: TrailError) -> Self {
        match err {
            TrailError::NotInitialized => ApiError::NotFound("Trail state".to_string()),
            TrailError::AlreadyCompletedToday => {
                ApiError::AlreadyCompleted(err.to_string())
            }
            TrailError::DataIntegrity(msg) => ApiError::DataIntegrity(msg),
            TrailError::Storage(inner) => {
                tracing::error!("Trail storage error: {:?}", inner);
                ApiError::DatabaseError(inner.to_string())
            }
        }
    }
}
