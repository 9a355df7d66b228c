//! Repository error types
//!
//! Structured errors raised by a document collection. The handler layer maps
//! them one-to-one onto [`ApiError`](crate::handlers::ApiError) kinds.
//!
//! # Example
//!
//! ```rust
//! use tourbook::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("tour", "0192a9c4");
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert!(error.entity_id.is_some());
//! ```

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Finding a single document by id
    FindById,
    /// Executing a list query
    FindMany,
    /// Counting documents matching filters
    Count,
    /// Inserting a new document
    Create,
    /// Updating an existing document
    Update,
    /// Deleting a document
    Delete,
    /// Expanding referenced documents
    Expand,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindById => write!(f, "find_by_id"),
            Self::FindMany => write!(f, "find_many"),
            Self::Count => write!(f, "count"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Expand => write!(f, "expand"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Document was not found
    NotFound,
    /// A unique field already holds this value
    AlreadyExists,
    /// The document does not conform to the resource schema
    ValidationFailed,
    /// A document could not be converted to or from its schema
    SerializationError,
    /// Other unclassified error
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured repository error with operation context
///
/// # Example
///
/// ```rust
/// use tourbook::repository::RepositoryError;
///
/// let error = RepositoryError::not_found("review", "abc");
/// assert_eq!(
///     error.to_string(),
///     "Repository not_found error during find_by_id: No document found with that ID [review: abc]"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Repository {kind} error during {operation}: {message}{}", entity_suffix(.entity_type, .entity_id))]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The resource kind involved (e.g., "tour")
    pub entity_type: Option<String>,
    /// The id or offending value involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a "not found" error with entity context
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::FindById,
            kind: RepositoryErrorKind::NotFound,
            message: "No document found with that ID".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.into()),
        }
    }

    /// Create an "already exists" error for a duplicate unique value
    ///
    /// ```rust
    /// use tourbook::repository::RepositoryError;
    ///
    /// let error = RepositoryError::already_exists("user", "jonas@example.io");
    /// assert_eq!(
    ///     error.message,
    ///     "Duplicate field value: jonas@example.io. Please use another value!"
    /// );
    /// ```
    pub fn already_exists(entity_type: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            operation: RepositoryOperation::Create,
            kind: RepositoryErrorKind::AlreadyExists,
            message: format!("Duplicate field value: {}. Please use another value!", value),
            entity_type: Some(entity_type.into()),
            entity_id: Some(value),
        }
    }

    /// Create a validation failed error
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Create,
            RepositoryErrorKind::ValidationFailed,
            message,
        )
    }

    /// Create a serialization error
    pub fn serialization_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::SerializationError, message)
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
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
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
