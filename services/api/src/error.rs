//! services/api/src/error.rs
//!
//! Defines the error types for the API service: `ApiError` for startup
//! failures and `HttpError` for failures returned to a client.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use study_assistant_core::listing::ListQueryError;
use study_assistant_core::ports::PortError;
use study_assistant_core::upload_rules::UploadRejection;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A request failure, rendered as `{ "error": ..., "status_code": ... }`.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.message,
            "status_code": self.status.as_u16(),
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<PortError> for HttpError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(what) => Self::not_found(what),
            PortError::Conflict(what) => Self::new(StatusCode::CONFLICT, what),
            PortError::Unauthorized => Self::unauthorized("Unauthorized"),
            PortError::Unavailable(what) => Self::new(StatusCode::SERVICE_UNAVAILABLE, what),
            PortError::Unexpected(detail) => {
                error!("Unexpected port error: {}", detail);
                Self::internal("Internal server error")
            }
        }
    }
}

/// Maps a failed token lookup: an unknown or expired token is a 401, anything
/// else is a server-side failure and must not log the client out.
pub fn auth_lookup_error(err: PortError) -> HttpError {
    match err {
        PortError::NotFound(_) | PortError::Unauthorized => {
            HttpError::unauthorized("Invalid or expired token")
        }
        other => HttpError::from(other),
    }
}

impl From<ListQueryError> for HttpError {
    fn from(err: ListQueryError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<UploadRejection> for HttpError {
    fn from(err: UploadRejection) -> Self {
        Self::bad_request(err.to_string())
    }
}
