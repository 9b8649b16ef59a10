//! Header policy for both hops.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Drop client headers that would collide with the signature
//! - Drop response headers the delivery network refuses in generated responses
//!
//! # Design Decisions
//! - Client-supplied `x-amz-*` and `authorization` never reach the backend
//! - The routing header is internal to the edge and is not forwarded
//! - Status and body are never touched here

use axum::http::{HeaderMap, HeaderName};

/// Check if a header is a hop-by-hop header that should not be forwarded.
pub fn is_hop_by_hop(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "trailers"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Headers the delivery network rejects or owns in a generated response.
pub fn is_edge_disallowed(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    matches!(
        name.as_str(),
        "via" | "x-cache" | "x-forwarded-proto" | "x-real-ip" | "expect"
    ) || name.starts_with("x-amz-cf-")
        || name.starts_with("x-edge-")
        || name.starts_with("x-accel-")
}

/// Copy the inbound headers that may travel to the backend.
///
/// `routing_header` is the explicit-target header, when that strategy is
/// active.
pub fn forwardable_request_headers(
    headers: &HeaderMap,
    routing_header: Option<&HeaderName>,
) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let lower = name.as_str();
        if is_hop_by_hop(lower)
            || matches!(lower, "host" | "authorization" | "content-length")
            || lower.starts_with("x-amz-")
            || routing_header.is_some_and(|h| h == name)
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Copy the backend response headers that may be relayed at the edge.
pub fn relayable_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if is_hop_by_hop(name.as_str()) || is_edge_disallowed(name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
