//! Middleware for authentication and request tracking

pub mod auth;
pub mod jwt;
pub mod request_tracking;
pub mod token;

pub use auth::{protect, restrict_to, AllowedRoles, CurrentUser, PERMISSION_DENIED};
pub use jwt::JwtAuth;
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer, SENSITIVE_HEADERS,
};
pub use token::{extract_token, Claims, NOT_LOGGED_IN};
