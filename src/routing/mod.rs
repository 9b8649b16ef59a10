//! Origin routing subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest (headers only)
//!     → resolver.rs (active strategy)
//!     → ResolvedOrigin (scheme + authority)
//!     → signing subsystem binds the signature to it
//! ```
//!
//! # Design Decisions
//! - One strategy per deployment, chosen at cold start
//! - Exactly one resolved backend per request

pub mod resolver;

pub use resolver::{OriginResolver, ResolutionError, ResolvedOrigin, ResolverConfigError};
