//! # tourbook
//!
//! REST backend for a tour-booking domain: tours, users and reviews served as
//! JSON documents, with query-string driven filtering, sorting, field
//! projection and pagination on every listing.
//!
//! ## Features
//!
//! - **Query builder**: `?price[lt]=500&sort=-ratingsAverage&fields=name&page=2&limit=10`
//! - **Handler factory**: list, get, create, update and delete for any collection
//! - **Authentication**: argon2 password hashing and HS256 JWTs, issued in a `jwt` cookie and read from `Authorization: Bearer`
//! - **Middleware stack**: request tracking, panic recovery, body size limits, timeouts
//! - **Health checks**: Liveness and readiness endpoints
//! - **Graceful shutdown**: Proper signal handling (SIGTERM, SIGINT)
//!
//! ## Example
//!
//! ```rust,no_run
//! use tourbook::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::new(config.clone())?;
//!     state.seed().await?;
//!
//!     Server::new(config).serve(router(state)).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod observability;
pub mod query;
pub mod repository;
pub mod resources;
pub mod routes;
pub mod server;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auth::{JwtGenerator, PasswordConfig, PasswordHasher};
    pub use crate::config::{Config, JwtConfig, MiddlewareConfig, ServiceConfig};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ItemResponse, ListResponse, ResourceHandlers};
    pub use crate::health::{health, readiness};
    pub use crate::middleware::{protect, restrict_to, AllowedRoles, CurrentUser, JwtAuth};
    pub use crate::observability::init_tracing;
    pub use crate::query::{QueryBuilder, QueryParams};
    pub use crate::repository::{Collection, Document, MemoryCollection, Resource};
    pub use crate::resources::{Collections, Review, Tour, User};
    pub use crate::routes::router;
    pub use crate::server::Server;
    pub use crate::state::AppState;

    pub use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Json, Response},
        routing::{delete, get, patch, post},
        Router,
    };

    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, warn};
}
