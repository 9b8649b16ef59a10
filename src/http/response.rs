//! Response handling and transformation.
//!
//! # Responsibilities
//! - Hold what the backend returned for the lifetime of one request
//! - Project it into the response the edge relays to the client
//! - Build the fixed error responses for rejected and failed requests
//!
//! # Design Decisions
//! - Status and body are relayed verbatim, 4xx/5xx included
//! - Hop-by-hop and edge-disallowed headers stripped automatically
//! - Gateway-generated errors are short plain-text bodies

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::security::headers::relayable_response_headers;

/// What the backend returned.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Time from sending the request to having the full body.
    pub latency: Duration,
}

/// The response handed back to the delivery network.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl EdgeResponse {
    /// Relay a backend response.
    pub fn from_backend(response: BackendResponse) -> Self {
        Self {
            status: response.status,
            headers: relayable_response_headers(&response.headers),
            body: response.body,
        }
    }

    /// A gateway-generated error.
    pub fn error(status: StatusCode, message: &'static str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        Self {
            status,
            headers,
            body: Bytes::from_static(message.as_bytes()),
        }
    }
}

impl IntoResponse for EdgeResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_status_relayed_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("text/html"));
        headers.insert("connection", HeaderValue::from_static("close"));

        let edge = EdgeResponse::from_backend(BackendResponse {
            status: StatusCode::NOT_FOUND,
            headers,
            body: Bytes::from_static(b"<h1>not here</h1>"),
            latency: Duration::from_millis(12),
        });

        assert_eq!(edge.status, StatusCode::NOT_FOUND);
        assert_eq!(edge.body, Bytes::from_static(b"<h1>not here</h1>"));
        assert!(edge.headers.get("connection").is_none());
        assert_eq!(edge.headers["content-type"], "text/html");
    }

    #[test]
    fn test_into_axum_response() {
        let response = EdgeResponse::error(StatusCode::GATEWAY_TIMEOUT, "Upstream timed out").into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert!(response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }
}
