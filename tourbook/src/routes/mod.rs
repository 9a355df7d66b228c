//! Application router
//!
//! ```text
//! /health, /ready
//! /api/v1/tours[/top-5-cheapest|/top-5-rating|/{id}[/reviews[/{review_id}]]]
//! /api/v1/reviews[/{review_id}]
//! /api/v1/users[/signup|/login|/me|/updateMe|/deleteMe|/updateMyPassword|/{id}]
//! ```

pub mod reviews;
pub mod tours;
pub mod users;

use axum::{extract::OriginalUri, routing::get, Router};

use crate::{
    handlers::{ApiError, ApiErrorKind, ApiOperation},
    health::{health, readiness},
    state::AppState,
};

/// Prefix of every API route
pub const API_PREFIX: &str = "/api/v1";

/// The complete router with state applied
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/tours", tours::routes(&state))
        .nest("/reviews", reviews::routes(&state))
        .nest("/users", users::routes(&state));

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(readiness))
        .nest(API_PREFIX, api)
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::new(
        ApiOperation::Get,
        ApiErrorKind::NotFound,
        format!("Can't find {} on this server!", uri),
    )
}
