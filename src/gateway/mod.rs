//! Gateway subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → routing (resolve origin)
//!     → signing (sign draft)
//!     → http::client (invoke backend)
//!     → Outcome → EdgeResponse
//! ```

pub mod handler;

pub use handler::{EdgeHandler, HandlerBuildError, Outcome, Rejection, Stage};
