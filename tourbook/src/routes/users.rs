//! `/api/v1/users`: accounts, sessions and user administration

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::SET_COOKIE, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::{Duration, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::Config,
    handlers::{ApiError, ApiOperation, ItemResponse, ListResponse},
    middleware::{auth::USER_GONE, protect, restrict_to, AllowedRoles, CurrentUser},
    query::QueryParams,
    repository::{rejected, Collection, Document, FilterClause, RepositoryOperation, Resource},
    resources::{user, User},
    state::AppState,
};

/// Roles allowed to administer users
pub const USER_ADMINS: &[&str] = &["admin"];

/// Name of the cookie carrying the token
pub const TOKEN_COOKIE: &str = "jwt";

const CREDENTIALS_REQUIRED: &str = "Email and password are required";
const BAD_CREDENTIALS: &str = "Incorrect email or password";
const WRONG_CURRENT_PASSWORD: &str = "Your current password is wrong.";
const NOT_FOR_PASSWORDS: &str =
    "This route is not for update password. You should not send password in the body";

/// User routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user).patch(update_user).delete(delete_user))
        .route_layer(from_fn_with_state(AllowedRoles(USER_ADMINS), restrict_to));

    let account = Router::new()
        .route("/updateMyPassword", patch(update_password))
        .route("/me", get(get_me))
        .route("/updateMe", patch(update_me))
        .route("/deleteMe", delete(delete_me))
        .merge(admin)
        .route_layer(from_fn_with_state(state.clone(), protect));

    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .merge(account)
}

/// `Set-Cookie` value carrying `token`
pub fn token_cookie(token: &str, config: &Config) -> String {
    let mut cookie = format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly",
        TOKEN_COOKIE, token, config.jwt.expires_in_secs
    );
    if config.service.is_production() {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Issue a token for the user in `response` and send it in body and cookie
fn send_token(state: &AppState, response: ItemResponse) -> Result<Response, ApiError> {
    let id = response.document.get("_id").and_then(Value::as_str);
    let role = response
        .document
        .get("role")
        .and_then(Value::as_str)
        .unwrap_or("user");
    let Some(id) = id else {
        return Err(ApiError::internal("User document has no id"));
    };

    let token = state.tokens().generate(id, role)?;
    let cookie = token_cookie(&token, state.config());
    Ok(([(SET_COOKIE, cookie)], response.with_token(token)).into_response())
}

fn text<'a>(body: &'a Document, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

async fn signup(
    State(state): State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let mut body = user::pick(body, &user::SIGNUP_FIELDS);

    let violations = user::check_signup(&body, state.hasher());
    if !violations.is_empty() {
        return Err(rejected::<User>(&violations, RepositoryOperation::Create).into());
    }

    body.remove("passwordConfirm");
    let password = text(&body, "password").unwrap_or_default();
    let hash = state.hasher().hash(password)?;
    body.insert("password".to_string(), Value::String(hash));

    let created = state.users().create_one(body).await?;
    send_token(&state, created)
}

#[derive(Debug, Deserialize)]
struct Credentials {
    email: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(credentials) = body?;
    let (Some(email), Some(password)) = (
        credentials.email.filter(|e| !e.trim().is_empty()),
        credentials.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request(CREDENTIALS_REQUIRED).with_operation(ApiOperation::Authenticate));
    };

    let users = &state.collections().users;
    let stored = users
        .find_one_with_hidden(&[FilterClause::eq("email", email.trim().to_lowercase())])
        .await
        .filter(|user| user.get("active") != Some(&Value::Bool(false)));

    let verified = match stored.as_ref().and_then(|user| text(user, "password")) {
        Some(hash) => state.hasher().verify(&password, hash)?,
        None => false,
    };
    let id = stored
        .as_ref()
        .and_then(|user| user.get("_id"))
        .and_then(Value::as_str)
        .filter(|_| verified)
        .ok_or_else(|| ApiError::unauthorized(BAD_CREDENTIALS))?;

    let document = users
        .find_by_id(id, &[])
        .await?
        .ok_or_else(|| ApiError::unauthorized(BAD_CREDENTIALS))?;

    tracing::info!(user_id = %id, "User logged in");
    send_token(&state, ItemResponse::new(User::SINGULAR, document))
}

async fn update_password(
    State(state): State<AppState>,
    caller: CurrentUser,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let stored = state
        .collections()
        .users
        .fetch_with_hidden(&caller.id)
        .await
        .ok_or_else(|| ApiError::unauthorized(USER_GONE))?;

    let current_ok = match (text(&body, "currentPassword"), text(&stored, "password")) {
        (Some(current), Some(hash)) => state.hasher().verify(current, hash)?,
        _ => false,
    };
    if !current_ok {
        return Err(ApiError::unauthorized(WRONG_CURRENT_PASSWORD));
    }

    let violations =
        user::check_new_password(&body, "newPassword", "newPasswordConfirm", state.hasher());
    if !violations.is_empty() {
        return Err(rejected::<User>(&violations, RepositoryOperation::Update).into());
    }

    let hash = state
        .hasher()
        .hash(text(&body, "newPassword").unwrap_or_default())?;
    // One second back so the token issued below postdates the change
    let changed_at = (Utc::now() - Duration::seconds(1)).to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut patch = Document::new();
    patch.insert("password".to_string(), Value::String(hash));
    patch.insert("passwordChangedAt".to_string(), Value::String(changed_at));

    let updated = state.users().update_one(&caller.id, patch).await?;
    tracing::info!(user_id = %caller.id, "Password changed");
    send_token(&state, updated)
}

async fn get_me(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<ItemResponse, ApiError> {
    state.users().get_one(&caller.id).await
}

async fn update_me(
    State(state): State<AppState>,
    caller: CurrentUser,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<ItemResponse, ApiError> {
    let Json(body) = body?;
    if user::touches_password(&body) {
        return Err(ApiError::bad_request(NOT_FOR_PASSWORDS).with_operation(ApiOperation::Update));
    }
    let patch = user::pick(body, &user::SELF_UPDATE_FIELDS);
    state.users().update_one(&caller.id, patch).await
}

async fn delete_me(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<StatusCode, ApiError> {
    let mut patch = Document::new();
    patch.insert("active".to_string(), Value::Bool(false));
    state.users().update_one(&caller.id, patch).await?;
    tracing::info!(user_id = %caller.id, "User deactivated");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<ListResponse, ApiError> {
    state
        .users()
        .list(&params, &[FilterClause::eq("active", true)])
        .await
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ItemResponse, ApiError> {
    state.users().get_one(&id).await
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<ItemResponse, ApiError> {
    let Json(patch) = body?;
    if user::touches_password(&patch) {
        return Err(ApiError::bad_request(NOT_FOR_PASSWORDS).with_operation(ApiOperation::Update));
    }
    state.users().update_one(&id, patch).await
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.users().delete_one(&id).await
}
