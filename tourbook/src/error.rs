//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Message sent in place of any server-side failure
pub const INTERNAL_MESSAGE: &str = "Something went very wrong!";

/// Result type alias using the application error
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error for startup, tokens and authentication
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// JWT decoding or signing error
    #[error("JWT error: {0}")]
    Jwt(Box<jsonwebtoken::errors::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a seed file or similar input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing, invalid or outdated credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Invalid request
    #[error("{0}")]
    BadRequest(String),

    /// Internal error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status this error renders with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Jwt(_) | Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show a client
    pub fn client_message(&self) -> String {
        match self {
            Error::Jwt(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    "Your token has expired! Please log in again.".to_string()
                }
                _ => "Invalid token. Please log in again!".to_string(),
            },
            Error::Unauthorized(msg) | Error::Forbidden(msg) | Error::BadRequest(msg) => {
                msg.clone()
            }
            Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Internal(_) => {
                INTERNAL_MESSAGE.to_string()
            }
        }
    }
}

/// Error response body
///
/// `status` is `fail` for client errors and `error` for server errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// `fail` or `error`
    pub status: String,

    /// Error message
    pub message: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let label = if status.is_server_error() { "error" } else { "fail" };
        Self {
            status: label.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Internal error: {}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "Request rejected: {}", self);
        }
        let body = ErrorResponse::new(status, self.client_message());
        (status, Json(body)).into_response()
    }
}

// Manual From implementations for boxed errors
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Jwt(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_error_response_status_label() {
        let fail = ErrorResponse::new(StatusCode::NOT_FOUND, "No document found with that ID");
        assert_eq!(fail.status, "fail");
        assert_eq!(fail.to_string(), "No document found with that ID");

        let error = ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE);
        assert_eq!(error.status, "error");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(Error::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(Error::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_jwt_messages() {
        let expired: Error =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::ExpiredSignature)
                .into();
        assert_eq!(expired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            expired.client_message(),
            "Your token has expired! Please log in again."
        );

        let invalid: Error =
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidSignature)
                .into();
        assert_eq!(invalid.client_message(), "Invalid token. Please log in again!");
    }

    #[tokio::test]
    async fn test_internal_message_is_masked() {
        let response = Error::Internal("argon2 exploded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            ErrorResponse {
                status: "error".into(),
                message: INTERNAL_MESSAGE.into()
            }
        );
    }
}
