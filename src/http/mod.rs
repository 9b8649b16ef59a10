//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Trigger (server.rs or trigger::cloudfront)
//!     → request.rs (InboundRequest)
//!     → [gateway handler resolves and signs]
//!     → client.rs (invoke backend, BackendResponse)
//!     → response.rs (EdgeResponse, headers stripped)
//!     → back to the trigger
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::{BackendClient, InvocationError};
pub use request::{InboundRequest, X_REQUEST_ID};
pub use response::{BackendResponse, EdgeResponse};
pub use server::HttpServer;
