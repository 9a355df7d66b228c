//! `/api/v1/tours`

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Json, Router,
};

use super::reviews;
use crate::{
    handlers::{ApiError, ItemResponse, ListResponse},
    middleware::{protect, restrict_to, AllowedRoles},
    query::QueryParams,
    repository::Document,
    resources::tour::ALIAS_FIELDS,
    state::AppState,
};

/// Roles allowed to create, change and remove tours
pub const TOUR_EDITORS: &[&str] = &["admin", "lead-guide"];

/// Tour routes, with the tour's reviews nested under `/{id}/reviews`
pub fn routes(state: &AppState) -> Router<AppState> {
    let writes = Router::new()
        .route("/", post(create_tour))
        .route("/{id}", patch(update_tour).delete(delete_tour))
        .route_layer(from_fn_with_state(AllowedRoles(TOUR_EDITORS), restrict_to))
        .route_layer(from_fn_with_state(state.clone(), protect));

    Router::new()
        .route("/top-5-cheapest", get(top_cheapest))
        .route("/top-5-rating", get(top_rated))
        .route("/", get(list_tours))
        .route("/{id}", get(get_tour))
        .merge(writes)
        .nest("/{id}/reviews", reviews::routes(state))
}

fn top_five(params: QueryParams, sort: &str) -> QueryParams {
    params
        .with("limit", "5")
        .with("sort", sort)
        .with("fields", ALIAS_FIELDS)
}

async fn top_cheapest(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<ListResponse, ApiError> {
    state.tours().list(&top_five(params, "price"), &[]).await
}

async fn top_rated(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<ListResponse, ApiError> {
    state
        .tours()
        .list(&top_five(params, "-ratingsAverage,price"), &[])
        .await
}

async fn list_tours(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<ListResponse, ApiError> {
    state.tours().list(&params, &[]).await
}

async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ItemResponse, ApiError> {
    state.tours().get_one(&id).await
}

async fn create_tour(
    State(state): State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<ItemResponse, ApiError> {
    let Json(body) = body?;
    state.tours().create_one(body).await
}

async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<ItemResponse, ApiError> {
    let Json(patch) = body?;
    state.tours().update_one(&id, patch).await
}

async fn delete_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.tours().delete_one(&id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_five_overrides_caller_controls() {
        let params = QueryParams::from_pairs([
            ("limit", "50"),
            ("difficulty", "easy"),
            ("fields", "description"),
        ]);
        let aliased = top_five(params, "price");
        assert_eq!(aliased.get("limit"), Some("5"));
        assert_eq!(aliased.get("sort"), Some("price"));
        assert_eq!(aliased.get("fields"), Some(ALIAS_FIELDS));
        assert_eq!(aliased.get("difficulty"), Some("easy"));
    }
}
