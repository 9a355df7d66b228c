//! Uniform REST handlers for document collections
//!
//! This module builds the HTTP-facing CRUD contract on top of the repository
//! traits: five operations per resource kind, a fixed success envelope and a
//! typed error that renders the failure envelope.
//!
//! # Features
//!
//! - **CRUD Handlers**: [`ResourceHandlers`] with list, get_one, create_one, update_one and delete_one
//! - **Envelopes**: [`ItemResponse`] and [`ListResponse`] for `{"status": "success", ...}` bodies
//! - **Error Handling**: [`ApiError`] with automatic HTTP status code mapping
//!
//! # Integration with Axum
//!
//! The response and error types implement `IntoResponse`, so route functions
//! return them directly:
//!
//! ```rust,ignore
//! use axum::extract::{Path, State};
//! use tourbook::handlers::{ApiError, ItemResponse};
//!
//! async fn get_tour(
//!     State(state): State<AppState>,
//!     Path(id): Path<String>,
//! ) -> Result<ItemResponse, ApiError> {
//!     state.tours.get_one(&id).await
//! }
//! ```

mod error;
mod factory;
mod response;

// Re-export all public types
pub use error::{ApiError, ApiErrorKind, ApiOperation};
pub use factory::{PostProcess, ResourceHandlers};
pub use response::{ItemResponse, ListResponse};
