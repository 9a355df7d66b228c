//! Resource schemas
//!
//! A [`Resource`] is the declared shape of one document kind. Incoming bodies
//! are conformed to it before they are stored: required fields are checked,
//! the body is deserialized into the typed shape (which drops unknown fields),
//! the shape is normalized and validated, and the result is serialized back.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{Document, RepositoryResult};

/// A field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Offending field
    pub field: &'static str,
    /// Human-readable message
    pub message: String,
}

impl FieldViolation {
    /// Create a new violation
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Declared shape of one document kind
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Model name used in validation messages (e.g., "Tour")
    const MODEL: &'static str;

    /// Singular envelope key (e.g., "tour")
    const SINGULAR: &'static str;

    /// Plural envelope key (e.g., "tours")
    const PLURAL: &'static str;

    /// Required fields with the message reported when each is missing
    const REQUIRED: &'static [(&'static str, &'static str)] = &[];

    /// Fields removed from output unless explicitly selected
    const HIDDEN: &'static [&'static str] = &[];

    /// Fields never returned or queried, whatever the projection.
    /// Read them through `fetch_with_hidden` or `find_one_with_hidden`.
    const SECRET: &'static [&'static str] = &[];

    /// Fields whose values must be unique across the collection
    const UNIQUE: &'static [&'static str] = &[];

    /// Trim, lowercase or otherwise canonicalize fields before validation
    fn normalize(&mut self) {}

    /// Check constraints that serde cannot express
    fn validate(&self) -> Vec<FieldViolation> {
        Vec::new()
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn violation_message<R: Resource>(violations: &[FieldViolation]) -> String {
    let details = violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} validation failed: {}", R::MODEL, details)
}

/// Validation error for violations found outside [`conform`]
///
/// Uses the same `<Model> validation failed: ...` message format.
pub fn rejected<R: Resource>(
    violations: &[FieldViolation],
    operation: RepositoryOperation,
) -> RepositoryError {
    RepositoryError::validation_failed(violation_message::<R>(violations)).with_operation(operation)
}

/// Conform a body to the shape of `R`
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
/// use tourbook::repository::{conform, Resource, RepositoryOperation};
///
/// #[derive(Serialize, Deserialize)]
/// struct Note {
///     text: String,
/// }
///
/// impl Resource for Note {
///     const MODEL: &'static str = "Note";
///     const SINGULAR: &'static str = "note";
///     const PLURAL: &'static str = "notes";
///     const REQUIRED: &'static [(&'static str, &'static str)] =
///         &[("text", "A note needs text")];
/// }
///
/// let body = json!({"text": "hi", "junk": 1});
/// let doc = conform::<Note>(body.as_object().unwrap().clone(), RepositoryOperation::Create).unwrap();
/// assert!(doc.get("junk").is_none());
///
/// let err = conform::<Note>(serde_json::Map::new(), RepositoryOperation::Create).unwrap_err();
/// assert_eq!(err.message, "Note validation failed: text: A note needs text");
/// ```
pub fn conform<R: Resource>(
    body: Document,
    operation: RepositoryOperation,
) -> RepositoryResult<Document> {
    let missing: Vec<FieldViolation> = R::REQUIRED
        .iter()
        .filter(|(field, _)| is_blank(body.get(*field)))
        .map(|&(field, message)| FieldViolation::new(field, message))
        .collect();
    if !missing.is_empty() {
        return Err(rejected::<R>(&missing, operation));
    }

    let mut shape: R = serde_json::from_value(Value::Object(body)).map_err(|e| {
        RepositoryError::validation_failed(format!("{} validation failed: {}", R::MODEL, e))
            .with_operation(operation)
    })?;

    shape.normalize();
    let violations = shape.validate();
    if !violations.is_empty() {
        return Err(rejected::<R>(&violations, operation));
    }

    match serde_json::to_value(shape) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(RepositoryError::serialization_error(
            operation,
            format!("{} did not serialize to an object", R::MODEL),
        )),
        Err(e) => Err(RepositoryError::serialization_error(operation, e.to_string())),
    }
}
