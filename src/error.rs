//! Error types for the HTTP layer
//!
//! Errors that survive the fallback chain and reach a handler.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;
use crate::store::PersistenceError;
use crate::upstream::{FetchError, FetchErrorKind};

// == App Error Enum ==
/// Request-level failure returned by the orchestrator.
#[derive(Error, Debug)]
pub enum AppError {
    /// Identifier absent from every source in the chain
    #[error("{0}")]
    NotFound(String),

    /// Upstream answered but a node could not be mapped to the canonical shape
    #[error("Upstream returned malformed node data: {0}")]
    Normalization(String),

    /// Anything else; the detail is logged, not returned
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err.kind {
            FetchErrorKind::Normalization => Self::Normalization(err.message),
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        Self::Internal(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Normalization(_) => {
                error!("request failed: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::Internal(detail) => {
                error!("request failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for handlers and the orchestrator.
pub type Result<T> = std::result::Result<T, AppError>;
