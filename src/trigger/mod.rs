//! Delivery-network trigger codecs.
//!
//! # Data Flow
//! ```text
//! CloudFront origin-request event (JSON)
//!     → cloudfront.rs → InboundRequest
//!     → gateway handler → EdgeResponse
//!     → cloudfront.rs → generated response (JSON)
//! ```

pub mod cloudfront;

pub use cloudfront::{CloudFrontEvent, CloudFrontResponse, EventError};
