//! API error types for handler operations
//!
//! This module provides structured error types for REST handler operations,
//! with automatic HTTP status code mapping via `IntoResponse`.
//!
//! # Example
//!
//! ```rust
//! use tourbook::handlers::{ApiError, ApiErrorKind};
//!
//! let error = ApiError::not_found("tour", "0190a1b2");
//! assert!(matches!(error.kind, ApiErrorKind::NotFound));
//! assert_eq!(error.message, "No document found with that ID");
//! ```

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{Error, ErrorResponse, INTERNAL_MESSAGE};
use crate::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Listing documents
    List,
    /// Getting a single document by ID
    Get,
    /// Creating a new document
    Create,
    /// Updating an existing document
    Update,
    /// Deleting a document
    Delete,
    /// Signing up, logging in or checking a token
    Authenticate,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Authenticate => write!(f, "authenticate"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Document was not found
    NotFound,
    /// Document failed schema validation
    ValidationFailed,
    /// Invalid request format or parameters
    BadRequest,
    /// Authentication required
    Unauthorized,
    /// Access denied
    Forbidden,
    /// Operation conflicts with existing data
    Conflict,
    /// Internal server error
    Internal,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::BadRequest => write!(f, "bad_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Conflict => write!(f, "conflict"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ValidationFailed | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error is expected and its message safe to show a client
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        !matches!(self, Self::Internal)
    }
}

/// Structured API error with operation context
///
/// The message is kept as raised. Internal messages are replaced only when
/// the error is rendered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("API {kind} error during {operation}: {message}{}", entity_suffix(.entity_type, .entity_id))]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The resource involved (e.g., "tour")
    pub entity_type: Option<String>,
    /// The ID of the document involved
    pub entity_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a "not found" error for a document ID
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self::new(
            ApiOperation::Get,
            ApiErrorKind::NotFound,
            "No document found with that ID",
        )
        .with_entity(entity_type, entity_id)
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::BadRequest, message)
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Authenticate, ApiErrorKind::Unauthorized, message)
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Authenticate, ApiErrorKind::Forbidden, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::Internal, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }
}

fn entity_suffix(entity_type: &Option<String>, entity_id: &Option<String>) -> String {
    match (entity_type, entity_id) {
        (Some(entity_type), Some(entity_id)) => format!(" [{}: {}]", entity_type, entity_id),
        _ => String::new(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        let message = if self.kind.is_operational() {
            tracing::debug!(
                operation = %self.operation,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
            self.message
        } else {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
            INTERNAL_MESSAGE.to_string()
        };

        (status, Json(ErrorResponse::new(status, message))).into_response()
    }
}

fn repository_operation_to_api_operation(op: RepositoryOperation) -> ApiOperation {
    match op {
        RepositoryOperation::FindById | RepositoryOperation::Expand => ApiOperation::Get,
        RepositoryOperation::FindMany | RepositoryOperation::Count => ApiOperation::List,
        RepositoryOperation::Create => ApiOperation::Create,
        RepositoryOperation::Update => ApiOperation::Update,
        RepositoryOperation::Delete => ApiOperation::Delete,
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let operation = repository_operation_to_api_operation(err.operation);

        let kind = match err.kind {
            RepositoryErrorKind::NotFound => ApiErrorKind::NotFound,
            RepositoryErrorKind::AlreadyExists => ApiErrorKind::Conflict,
            RepositoryErrorKind::ValidationFailed => ApiErrorKind::ValidationFailed,
            RepositoryErrorKind::SerializationError | RepositoryErrorKind::Other => {
                ApiErrorKind::Internal
            }
        };

        Self {
            operation,
            kind,
            message: err.message,
            entity_type: err.entity_type,
            entity_id: err.entity_id,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::Jwt(_) | Error::Unauthorized(_) => ApiErrorKind::Unauthorized,
            Error::Forbidden(_) => ApiErrorKind::Forbidden,
            Error::BadRequest(_) => ApiErrorKind::BadRequest,
            Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Internal(_) => {
                ApiErrorKind::Internal
            }
        };
        let message = if kind.is_operational() {
            err.client_message()
        } else {
            err.to_string()
        };
        Self::new(ApiOperation::Authenticate, kind, message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text()).with_operation(ApiOperation::List)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
