//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` for the three failure classes of the query layer and
//! implements Axum's `IntoResponse` to convert them to HTTP responses with
//! JSON error bodies.
//!
//! Error mappings:
//! - `NotFound` → 404 (unresolvable/ambiguous/wrong-kind revisions, unknown
//!   projects, the unsupported blob listing)
//! - `InvalidArgument` → 400 (diff of a root or merge commit)
//! - `RepositoryUnavailable` → 503 with a fixed body; the cause is logged
//!   server-side where it was detected and never sent to the client

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("repository unavailable")]
    RepositoryUnavailable,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::RepositoryUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "repository temporarily unavailable".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
