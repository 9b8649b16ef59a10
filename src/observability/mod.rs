//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handler stages produce:
//!     → logging.rs (structured log events keyed by request_id and stage)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stderr)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request
//! - Configuration errors log at error level, transient ones at warn

pub mod logging;
pub mod metrics;
