//! Raw query-string parameters
//!
//! [`QueryParams`] keeps every `key=value` pair of a request's query string in
//! order, including repeated keys (`duration=5&duration=9`).

use axum::extract::{FromRequestParts, Query};
use axum::extract::rejection::QueryRejection;
use http::request::Parts;
use http::Uri;

use crate::handlers::ApiError;

/// Ordered, untrusted query-string pairs of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ordered pairs
    ///
    /// ```rust
    /// use tourbook::query::QueryParams;
    ///
    /// let params = QueryParams::from_pairs([("duration", "5"), ("duration", "9")]);
    /// assert_eq!(params.get("duration"), Some("9"));
    /// assert_eq!(params.iter().count(), 2);
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Decode the query component of a URI
    pub fn from_uri(uri: &Uri) -> Result<Self, QueryRejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)?;
        Ok(Self { pairs })
    }

    /// Last value given for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` was given at all
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// All pairs in request order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every value of `key` with `value`
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.pairs.retain(|(k, _)| *k != key);
        self.pairs.push((key, value.into()));
        self
    }
}

impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_uri(&parts.uri)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri_keeps_order_and_repeats() {
        let uri: Uri = "/api/v1/tours?duration=5&price%5Bgte%5D=500&duration=9"
            .parse()
            .unwrap();
        let params = QueryParams::from_uri(&uri).unwrap();
        let pairs: Vec<(&str, &str)> = params.iter().collect();
        assert_eq!(
            pairs,
            vec![("duration", "5"), ("price[gte]", "500"), ("duration", "9")]
        );
    }

    #[test]
    fn test_from_uri_without_query() {
        let uri: Uri = "/api/v1/tours".parse().unwrap();
        assert_eq!(QueryParams::from_uri(&uri).unwrap(), QueryParams::new());
    }

    #[test]
    fn test_get_returns_last_value() {
        let params = QueryParams::from_pairs([("sort", "price"), ("sort", "-name")]);
        assert_eq!(params.get("sort"), Some("-name"));
        assert_eq!(params.get("limit"), None);
        assert!(params.contains("sort"));
    }

    #[test]
    fn test_with_replaces_all_values() {
        let params = QueryParams::from_pairs([("limit", "50"), ("difficulty", "easy"), ("limit", "7")])
            .with("limit", "5");
        let pairs: Vec<(&str, &str)> = params.iter().collect();
        assert_eq!(pairs, vec![("difficulty", "easy"), ("limit", "5")]);
    }
}
