//! Response envelopes for REST handlers
//!
//! Every success body has the shape
//! `{"status": "success", "results"?: n, "token"?: "...", "data": {<name>: value}}`
//! where `<name>` is the resource's singular or plural name.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use tourbook::handlers::{ItemResponse, ListResponse};
//!
//! let doc = json!({"_id": "t-1", "name": "The Forest Hiker"});
//! let item = ItemResponse::new("tour", doc.as_object().unwrap().clone());
//! assert_eq!(
//!     item.to_json(),
//!     json!({"status": "success", "data": {"tour": {"_id": "t-1", "name": "The Forest Hiker"}}})
//! );
//!
//! let list = ListResponse::new("tours", Vec::new());
//! assert_eq!(list.to_json(), json!({"status": "success", "results": 0, "data": {"tours": []}}));
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::repository::Document;

#[derive(Serialize)]
struct Envelope<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<&'a str>,
    data: Map<String, Value>,
}

impl<'a> Envelope<'a> {
    fn success(name: &str, value: Value) -> Self {
        let mut data = Map::new();
        data.insert(name.to_string(), value);
        Self {
            status: "success",
            results: None,
            token: None,
            data,
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> Value {
    // Envelopes hold only JSON maps and strings, which always serialize
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Single document response
#[derive(Debug, Clone, PartialEq)]
pub struct ItemResponse {
    /// Envelope key under `data`
    pub name: &'static str,
    /// The document
    pub document: Document,
    /// Signed token issued with this response
    pub token: Option<String>,
    status: StatusCode,
}

impl ItemResponse {
    /// 200 response carrying one document
    pub fn new(name: &'static str, document: Document) -> Self {
        Self {
            name,
            document,
            token: None,
            status: StatusCode::OK,
        }
    }

    /// 201 response carrying a newly created document
    pub fn created(name: &'static str, document: Document) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::new(name, document)
        }
    }

    /// Attach a signed token to the body
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// HTTP status this response renders with
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Rendered body
    pub fn to_json(&self) -> Value {
        let mut envelope = Envelope::success(self.name, Value::Object(self.document.clone()));
        envelope.token = self.token.as_deref();
        to_value(&envelope)
    }
}

impl IntoResponse for ItemResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.to_json())).into_response()
    }
}

/// Document list response
#[derive(Debug, Clone, PartialEq)]
pub struct ListResponse {
    /// Envelope key under `data`
    pub name: &'static str,
    /// The documents, in query order
    pub documents: Vec<Document>,
}

impl ListResponse {
    /// 200 response carrying a list of documents
    pub fn new(name: &'static str, documents: Vec<Document>) -> Self {
        Self { name, documents }
    }

    /// Number of documents returned
    pub fn results(&self) -> usize {
        self.documents.len()
    }

    /// Rendered body
    pub fn to_json(&self) -> Value {
        let documents = self
            .documents
            .iter()
            .cloned()
            .map(Value::Object)
            .collect();
        let mut envelope = Envelope::success(self.name, Value::Array(documents));
        envelope.results = Some(self.results());
        to_value(&envelope)
    }
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.to_json())).into_response()
    }
}
