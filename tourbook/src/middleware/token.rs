//! Token claims and extraction

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Message for requests that carry no token
pub const NOT_LOGGED_IN: &str = "You are not logged in! Please log in to get access.";

/// Claims carried by every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's document id
    pub sub: String,

    /// Roles of the user when the token was issued
    #[serde(default)]
    pub roles: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Token ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Issuer (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Extract token from Authorization header (Bearer scheme)
pub fn extract_token(headers: &HeaderMap) -> Result<String, Error> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Unauthorized(NOT_LOGGED_IN.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_token(&headers("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        for bad in [HeaderMap::new(), headers("Basic dXNlcjpwYXNz"), headers("Bearer ")] {
            match extract_token(&bad) {
                Err(Error::Unauthorized(msg)) => assert_eq!(msg, NOT_LOGGED_IN),
                other => panic!("expected Unauthorized, got {:?}", other),
            }
        }
    }
}
