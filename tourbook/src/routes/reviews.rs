//! `/api/v1/reviews`, also nested as `/api/v1/tours/{id}/reviews`

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    handlers::{ApiError, ItemResponse, ListResponse},
    middleware::{protect, restrict_to, AllowedRoles, CurrentUser},
    query::QueryParams,
    repository::{Document, FilterClause},
    state::AppState,
};

/// Roles allowed to write reviews
pub const REVIEW_AUTHORS: &[&str] = &["user"];

/// Roles allowed to change and remove reviews
pub const REVIEW_MODERATORS: &[&str] = &["user", "admin"];

/// Path parameters of both mounts
///
/// `id` is the tour id and only present when nested under a tour.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReviewPath {
    #[serde(rename = "id")]
    tour_id: Option<String>,
    review_id: Option<String>,
}

impl ReviewPath {
    fn scope(&self) -> Vec<FilterClause> {
        self.tour_id
            .iter()
            .map(|tour| FilterClause::eq("tour", tour.as_str()))
            .collect()
    }

    fn review_id(&self) -> &str {
        self.review_id.as_deref().unwrap_or_default()
    }
}

/// Review routes; every one requires a logged-in caller
pub fn routes(state: &AppState) -> Router<AppState> {
    let authors = Router::new()
        .route("/", post(create_review))
        .route_layer(from_fn_with_state(AllowedRoles(REVIEW_AUTHORS), restrict_to));

    let moderators = Router::new()
        .route("/{review_id}", patch(update_review).delete(delete_review))
        .route_layer(from_fn_with_state(AllowedRoles(REVIEW_MODERATORS), restrict_to));

    Router::new()
        .route("/", get(list_reviews))
        .route("/{review_id}", get(get_review))
        .merge(authors)
        .merge(moderators)
        .route_layer(from_fn_with_state(state.clone(), protect))
}

/// Fill in `tour` from the path and `user` from the caller when absent
fn with_defaults(mut body: Document, path: &ReviewPath, caller: &CurrentUser) -> Document {
    let missing = |value: Option<&Value>| value.map_or(true, |v| v.is_null() || v == "");
    if missing(body.get("tour")) {
        if let Some(tour) = &path.tour_id {
            body.insert("tour".to_string(), Value::String(tour.clone()));
        }
    }
    if missing(body.get("user")) {
        body.insert("user".to_string(), Value::String(caller.id.clone()));
    }
    body
}

async fn list_reviews(
    State(state): State<AppState>,
    Path(path): Path<ReviewPath>,
    params: QueryParams,
) -> Result<ListResponse, ApiError> {
    state.reviews().list(&params, &path.scope()).await
}

async fn get_review(
    State(state): State<AppState>,
    Path(path): Path<ReviewPath>,
) -> Result<ItemResponse, ApiError> {
    state.reviews().get_one(path.review_id()).await
}

async fn create_review(
    State(state): State<AppState>,
    Path(path): Path<ReviewPath>,
    caller: CurrentUser,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<ItemResponse, ApiError> {
    let Json(body) = body?;
    state
        .reviews()
        .create_one(with_defaults(body, &path, &caller))
        .await
}

async fn update_review(
    State(state): State<AppState>,
    Path(path): Path<ReviewPath>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<ItemResponse, ApiError> {
    let Json(patch) = body?;
    state.reviews().update_one(path.review_id(), patch).await
}

async fn delete_review(
    State(state): State<AppState>,
    Path(path): Path<ReviewPath>,
) -> Result<StatusCode, ApiError> {
    state.reviews().delete_one(path.review_id()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Claims;
    use serde_json::json;

    fn caller() -> CurrentUser {
        CurrentUser {
            id: "user-1".to_string(),
            role: "user".to_string(),
            claims: Claims {
                sub: "user-1".to_string(),
                roles: vec!["user".to_string()],
                exp: 0,
                iat: 0,
                jti: None,
                iss: None,
                aud: None,
            },
        }
    }

    fn body(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults_fill_only_missing_fields() {
        let nested = ReviewPath {
            tour_id: Some("tour-9".to_string()),
            review_id: None,
        };
        let filled = with_defaults(body(json!({"review": "Nice"})), &nested, &caller());
        assert_eq!(filled["tour"], json!("tour-9"));
        assert_eq!(filled["user"], json!("user-1"));

        let explicit = with_defaults(
            body(json!({"review": "Nice", "tour": "tour-2", "user": "user-7"})),
            &nested,
            &caller(),
        );
        assert_eq!(explicit["tour"], json!("tour-2"));
        assert_eq!(explicit["user"], json!("user-7"));
    }

    #[test]
    fn test_unnested_path_has_no_scope() {
        let path = ReviewPath::default();
        assert!(path.scope().is_empty());
        assert!(with_defaults(body(json!({})), &path, &caller()).get("tour").is_none());
    }
}
