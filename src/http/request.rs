//! Inbound request model.
//!
//! # Responsibilities
//! - Hold what the trigger hands over: method, path, query, headers, body
//! - Parse raw query strings into an ordered multimap
//! - Carry the request ID used to correlate logs
//!
//! # Design Decisions
//! - Immutable once built; the handler only ever reads it
//! - Body is fully buffered; signing needs the complete payload
//! - Client identity is not modelled; the gateway signs as itself

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use url::form_urlencoded;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// A request as received from the delivery network.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
}

impl InboundRequest {
    /// Build from already-decoded query pairs.
    pub fn new(
        method: Method,
        path: impl Into<String>,
        query: Vec<(String, String)>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self {
            method,
            path,
            query,
            headers,
            body,
        }
    }

    /// Build from a raw `a=1&b=2` query string (no leading `?`).
    pub fn with_raw_query(
        method: Method,
        path: impl Into<String>,
        raw_query: Option<&str>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        let query = raw_query.map(parse_query).unwrap_or_default();
        Self::new(method, path, query, headers, body)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path as received, still percent-encoded.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decoded query pairs in arrival order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Correlation ID from the request, if the trigger supplied one.
    pub fn request_id(&self) -> Option<&str> {
        self.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}

/// Decode a raw query string with form semantics (`+` is a space).
pub fn parse_query(raw: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(raw.trim_start_matches('?').as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_keeps_order_and_repeats() {
        let query = parse_query("q=rust+lang&category=general&q=second&empty=");
        assert_eq!(
            query,
            vec![
                ("q".to_string(), "rust lang".to_string()),
                ("category".to_string(), "general".to_string()),
                ("q".to_string(), "second".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_path_gets_leading_slash() {
        let req = InboundRequest::with_raw_query(
            Method::GET,
            "search",
            None,
            HeaderMap::new(),
            Bytes::new(),
        );
        assert_eq!(req.path(), "/search");
        assert!(req.query().is_empty());
        assert!(req.request_id().is_none());
    }
}
