//! Query-string driven list queries
//!
//! The reserved keys `page`, `sort`, `limit` and `fields` control paging,
//! ordering and projection. Every other key filters, optionally with an
//! operator suffix:
//!
//! ```text
//! GET /api/v1/tours?difficulty=easy&price[lt]=1500&sort=-price,name&fields=name,price&page=2&limit=10
//! ```

mod builder;
mod params;

pub use builder::{
    coerce_value, filter_clauses, pagination, projection, sort_order, QueryBuilder, DEFAULT_LIMIT,
    DEFAULT_PAGE, RESERVED_KEYS,
};
pub use params::QueryParams;
