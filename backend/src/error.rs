//! Error handling for the Branch Stock Management Platform
//!
//! Every failure here is a recoverable, caller-visible condition; validation
//! and authorization failures are raised before any mutation, and storage
//! failures roll the whole operation back.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Invalid quantity: {message}")]
    InvalidQuantity {
        message: String,
        /// Offending line index for batch submissions
        line: Option<usize>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    // Stock errors
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Reversal window expired for movement {0}")]
    StaleReversal(uuid::Uuid),

    // Workflow errors
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    // Authorization errors
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Lookup errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidQuantity { line, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_QUANTITY".to_string(),
                    message: message.clone(),
                    line: *line,
                },
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: msg.clone(),
                    line: None,
                },
            ),
            AppError::InsufficientStock(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: msg.clone(),
                    line: None,
                },
            ),
            AppError::StaleReversal(id) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "STALE_REVERSAL".to_string(),
                    message: format!("Movement {} is older than the reversal window", id),
                    line: None,
                },
            ),
            AppError::InvalidTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_TRANSITION".to_string(),
                    message: msg.clone(),
                    line: None,
                },
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::FORBIDDEN,
                ErrorDetail {
                    code: "UNAUTHORIZED".to_string(),
                    message: msg.clone(),
                    line: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    line: None,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONFLICT".to_string(),
                    message: msg.clone(),
                    line: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    line: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    line: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
