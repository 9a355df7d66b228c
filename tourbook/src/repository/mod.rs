//! Document collections
//!
//! This module provides the collection interface the query builder and the
//! resource handlers are written against, plus an in-memory implementation.
//!
//! # Features
//!
//! - **Collections**: [`Collection`] for find/create/update/delete/count over one resource kind
//! - **Pending queries**: [`QueryHandle`] narrowed by filter, sort, projection and window
//! - **Schemas**: [`Resource`] and [`conform`] for required fields, validation and unknown-field dropping
//! - **Relations**: [`Relation`] and [`DocumentSource`] for expanding referenced documents
//! - **Storage**: [`MemoryCollection`] backed by a `tokio` `RwLock`
//!
//! # Example
//!
//! ```rust,ignore
//! use tourbook::repository::{Collection, FilterClause, MemoryCollection, QueryHandle, Sort};
//! use tourbook::resources::Tour;
//!
//! let tours = MemoryCollection::<Tour>::new();
//! let easy = tours
//!     .find_many(&[])
//!     .apply_filter(&[FilterClause::eq("difficulty", "easy")])
//!     .apply_sort(&Sort::ascending("price"))
//!     .execute()
//!     .await?;
//! ```

mod criteria;
mod error;
mod memory;
mod schema;
mod traits;

pub use criteria::{
    FilterClause, FilterOperator, FilterValue, OrderDirection, Pagination, Projection, Sort,
    SortKey,
};
pub(crate) use criteria::parse_timestamp;
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::{MemoryCollection, MemoryQuery, Relation};
pub use schema::{conform, rejected, FieldViolation, Resource};
pub use traits::{
    Collection, Document, DocumentSource, QueryHandle, RepositoryResult, CREATED_AT_FIELD,
    ID_FIELD, VERSION_FIELD,
};
