//! Unified error handling for the auth API.
//!
//! Every failure a handler can hit is one of these variants, so handlers use
//! `?` throughout and the status code / body mapping lives in one place.
//! The 301 responses for "invalid token" and "user not found" are what
//! existing clients rely on.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared_types::{ErrorDetail, ErrorResponse};
use thiserror::Error;

use crate::repository::StoreError;

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Payload failed its schema; one message per violated field
    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// Google token could not be verified or belongs to someone else
    #[error("invalid token")]
    InvalidToken,

    /// No local account for the presented identity
    #[error("user not found")]
    UserNotFound,

    /// The Google identity is already registered
    #[error("account already exist")]
    AccountExists,

    /// Session credential missing or invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// JSON parsing error
    #[error("Invalid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Store or signing failure; the body is withheld
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => ApiError::AccountExists,
            StoreError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(messages) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: ErrorDetail::Fields(messages),
                    details: None,
                },
            ),
            ApiError::InvalidToken => (
                StatusCode::MOVED_PERMANENTLY,
                ErrorResponse::message("invalid token"),
            ),
            ApiError::UserNotFound => (
                StatusCode::MOVED_PERMANENTLY,
                ErrorResponse::message("user not found"),
            ),
            ApiError::AccountExists => (
                StatusCode::CONFLICT,
                ErrorResponse::message("account already exist"),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorResponse::message(msg)),
            ApiError::JsonParse(e) => {
                tracing::warn!("JSON parse error: {:?}", e);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: ErrorDetail::Message("Invalid JSON format".to_string()),
                        details: Some(e.to_string()),
                    },
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
