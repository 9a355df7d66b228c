//! Collection trait definitions
//!
//! This module provides the document collection interface consumed by the
//! query builder and the resource handlers. Like the rest of the crate it uses
//! RPITIT (Return Position Impl Trait In Traits) for async methods.
//!
//! - [`Collection`]: CRUD plus a [`QueryHandle`] factory for list queries
//! - [`QueryHandle`]: a pending, unexecuted list query
//! - [`DocumentSource`]: object-safe lookups used for relation expansion

use std::future::Future;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::criteria::{FilterClause, Projection, Sort};
use super::error::RepositoryError;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// A stored document
pub type Document = Map<String, Value>;

/// Name of the identifier field on every document
pub const ID_FIELD: &str = "_id";

/// Name of the reserved internal version field
pub const VERSION_FIELD: &str = "__v";

/// Name of the creation timestamp field
pub const CREATED_AT_FIELD: &str = "createdAt";

/// A pending list query against one collection
///
/// Each stage consumes the handle and returns it narrowed, so a handle is
/// threaded by value through the builder stages and executed exactly once.
pub trait QueryHandle: Send + Sized {
    /// Add filter clauses; all clauses must hold for a document to match
    #[must_use]
    fn apply_filter(self, clauses: &[FilterClause]) -> Self;

    /// Replace the ordering
    #[must_use]
    fn apply_sort(self, sort: &Sort) -> Self;

    /// Replace the projection
    #[must_use]
    fn apply_projection(self, projection: &Projection) -> Self;

    /// Window the ordered results
    #[must_use]
    fn apply_skip_limit(self, skip: u64, limit: u64) -> Self;

    /// Expand the named relations on every result
    #[must_use]
    fn expand(self, relations: &[String]) -> Self;

    /// Run the query
    fn execute(self) -> impl Future<Output = RepositoryResult<Vec<Document>>> + Send;
}

/// Document collection for one resource kind
///
/// # Example
///
/// ```rust,ignore
/// use tourbook::repository::{Collection, FilterClause, QueryHandle};
///
/// let query = tours
///     .find_many(&[])
///     .apply_filter(&[FilterClause::eq("difficulty", "easy")])
///     .apply_skip_limit(0, 10);
/// let docs = query.execute().await?;
/// ```
pub trait Collection: Send + Sync + 'static {
    /// Pending query type returned by [`find_many`](Self::find_many)
    type Query: QueryHandle;

    /// Singular resource name used in response envelopes (e.g., "tour")
    const SINGULAR: &'static str;

    /// Plural resource name used in response envelopes (e.g., "tours")
    const PLURAL: &'static str;

    /// Start a list query restricted by `scope`
    fn find_many(&self, scope: &[FilterClause]) -> Self::Query;

    /// Find a document by id, expanding the named relations
    ///
    /// Returns `Ok(None)` if no document has this id.
    fn find_by_id(
        &self,
        id: &str,
        expand: &[String],
    ) -> impl Future<Output = RepositoryResult<Option<Document>>> + Send;

    /// Validate and insert a new document
    ///
    /// Fields outside the resource's declared shape are dropped.
    fn create(&self, body: Document) -> impl Future<Output = RepositoryResult<Document>> + Send;

    /// Merge `patch` into the document with this id and re-validate the result
    ///
    /// Returns `Ok(None)` if no document has this id.
    fn update_by_id(
        &self,
        id: &str,
        patch: Document,
    ) -> impl Future<Output = RepositoryResult<Option<Document>>> + Send;

    /// Remove the document with this id, returning it
    ///
    /// Returns `Ok(None)` if no document has this id.
    fn delete_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = RepositoryResult<Option<Document>>> + Send;

    /// Count the documents satisfying every clause
    fn count_all(
        &self,
        filter: &[FilterClause],
    ) -> impl Future<Output = RepositoryResult<u64>> + Send;
}

/// Object-safe lookups used when another collection expands a relation
///
/// Returned documents have hidden fields removed and this source's default
/// expansions applied.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Look up one document by id
    async fn lookup(&self, id: &str) -> RepositoryResult<Option<Document>>;

    /// Look up every document whose `field` equals `value`
    async fn lookup_where(&self, field: &str, value: &Value) -> RepositoryResult<Vec<Document>>;
}
