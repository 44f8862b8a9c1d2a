//! Domain error types for the web application
//!
//! Errors are structured internally for logging/debugging but provide
//! generic responses to clients to avoid leaking sensitive information.
//! Field-level validation failures are not errors: handlers resolve them
//! locally by re-rendering the form.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Top-level request error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Form decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Not found")]
    NotFound,
}

/// Errors reported by the persistence port.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("no matching record found")]
    NoRecord,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(String),

    #[error("expiry out of range: {0} days")]
    ExpiryOutOfRange(i32),
}

/// Errors binding a submitted form onto its typed destination.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unsupported content type: {0}")]
    ContentType(String),

    #[error("unreadable request body: {0}")]
    Body(String),

    #[error("malformed form data: {0}")]
    Malformed(#[from] serde_urlencoded::de::Error),

    #[error("could not re-encode form values: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Model(ModelError::NoRecord) => StatusCode::NOT_FOUND,
            AppError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,

            AppError::Decode(_) => StatusCode::BAD_REQUEST,

            AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,

            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Get a client-safe response message (generic, no internal details)
    pub fn client_message(&self) -> &'static str {
        self.status_code()
            .canonical_reason()
            .unwrap_or("Internal Server Error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, debug = ?self, "request failed");
        } else if status == StatusCode::BAD_REQUEST {
            tracing::warn!(error = %self, "unexpected request shape");
        } else {
            tracing::debug!(error = %self, "client error");
        }
        (status, self.client_message()).into_response()
    }
}
