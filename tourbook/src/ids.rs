//! Request identifiers
//!
//! Every request gets a TypeID with the `req` prefix and a UUIDv7 suffix
//! (e.g. `req_01h455vb4pex5vsknk084sn02q`), so ids sort by arrival time.
//! Clients may send their own `x-request-id`, which is kept.

use std::fmt;

use http::{HeaderMap, Request};
use mti::prelude::*;
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

/// Header carrying the request id in both directions
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Time-sortable request identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    /// Prefix of every generated id
    pub const PREFIX: &'static str = "req";

    /// Generate a new id
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    /// Textual form
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The id a request carries, generated or client-supplied
    pub fn from_headers(headers: &HeaderMap) -> Option<&str> {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `tower-http` id maker producing [`RequestId`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let header_value = http::HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(header_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_format() {
        let id = RequestId::new();
        assert!(id.as_str().starts_with("req_"));
        // prefix (3) + underscore (1) + suffix (26)
        assert_eq!(id.as_str().len(), 30);
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn test_ids_are_time_sortable() {
        let first = RequestId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = RequestId::new();
        assert!(first.as_str() < second.as_str());
    }

    #[test]
    fn test_maker_sets_header_value() {
        let request = Request::builder().body(()).unwrap();
        let made = MakeTypedRequestId.make_request_id(&request).unwrap();
        let value = made.header_value().to_str().unwrap();
        assert!(value.starts_with("req_"));

        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, made.header_value().clone());
        assert_eq!(RequestId::from_headers(&headers), Some(value));
    }
}
