//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Forward hop:
//!     inbound headers → headers.rs (strip hop-by-hop, client auth, routing header)
//!     → signer adds its own host/date/hash/authorization
//!
//! Return hop:
//!     backend headers → headers.rs (strip hop-by-hop, edge-disallowed)
//!     → edge response
//! ```

pub mod headers;

pub use headers::{forwardable_request_headers, is_hop_by_hop, relayable_response_headers};
