//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{handlers::ApiError, repository::Collection, state::AppState};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Deployment environment
    pub environment: String,
}

/// Readiness check response with per-collection document counts
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,

    /// Document count per collection
    pub collections: BTreeMap<String, u64>,
}

/// Simple health check (liveness)
///
/// Always returns 200 OK if the service is running.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        environment: state.config().service.environment.clone(),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check
///
/// Counts every collection; a failing count fails the check.
pub async fn readiness(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let collections = state.collections();
    let mut counts = BTreeMap::new();
    counts.insert("tours".to_string(), collections.tours.count_all(&[]).await?);
    counts.insert("users".to_string(), collections.users.count_all(&[]).await?);
    counts.insert("reviews".to_string(), collections.reviews.count_all(&[]).await?);

    let response = ReadinessResponse {
        ready: true,
        service: state.config().service.name.clone(),
        collections: counts,
    };

    Ok((StatusCode::OK, Json(response)))
}
