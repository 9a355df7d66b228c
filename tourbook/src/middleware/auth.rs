//! `protect` and `restrict_to` route guards
//!
//! ```rust,ignore
//! use axum::middleware::from_fn_with_state;
//! use tourbook::middleware::{protect, restrict_to, AllowedRoles};
//!
//! let writes = Router::new()
//!     .route("/", post(create_tour))
//!     .route_layer(from_fn_with_state(AllowedRoles(&["admin", "lead-guide"]), restrict_to))
//!     .route_layer(from_fn_with_state(state.clone(), protect));
//! ```

use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use super::token::{extract_token, Claims, NOT_LOGGED_IN};
use crate::handlers::ApiError;
use crate::repository::parse_timestamp;
use crate::state::AppState;

/// Message for tokens whose user is gone or deactivated
pub const USER_GONE: &str = "The user belonging to this token does no longer exist.";

/// Message for tokens issued before the last password change
pub const PASSWORD_CHANGED: &str = "User recently changed password! Please login again.";

/// Message for authenticated users lacking a role
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action";

/// The authenticated caller, inserted by [`protect`]
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    /// The user's document id
    pub id: String,
    /// The user's role as currently stored
    pub role: String,
    /// Claims of the presented token
    pub claims: Claims,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized(NOT_LOGGED_IN))
    }
}

/// Roles accepted by [`restrict_to`]
#[derive(Debug, Clone, Copy)]
pub struct AllowedRoles(pub &'static [&'static str]);

fn issued_before_password_change(user: &serde_json::Map<String, Value>, iat: i64) -> bool {
    user.get("passwordChangedAt")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .is_some_and(|changed_at| changed_at.timestamp() > iat)
}

/// Require a valid bearer token belonging to an active user
pub async fn protect(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())?;
    let claims = state.jwt().validate_token(&token)?;

    let user = state
        .collections()
        .users
        .fetch_with_hidden(&claims.sub)
        .await
        .filter(|user| user.get("active") != Some(&Value::Bool(false)))
        .ok_or_else(|| ApiError::unauthorized(USER_GONE))?;

    if issued_before_password_change(&user, claims.iat) {
        return Err(ApiError::unauthorized(PASSWORD_CHANGED));
    }

    let role = user
        .get("role")
        .and_then(Value::as_str)
        .unwrap_or("user")
        .to_string();

    tracing::debug!(user_id = %claims.sub, role = %role, "Authenticated request");

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub.clone(),
        role,
        claims,
    });

    Ok(next.run(request).await)
}

/// Require the caller's role to be one of the allowed roles
///
/// Must run after [`protect`].
pub async fn restrict_to(
    State(AllowedRoles(roles)): State<AllowedRoles>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(user) = request.extensions().get::<CurrentUser>() else {
        return Err(ApiError::unauthorized(NOT_LOGGED_IN));
    };
    if !roles.contains(&user.role.as_str()) {
        return Err(ApiError::forbidden(PERMISSION_DENIED));
    }
    Ok(next.run(request).await)
}
