//! Request signing subsystem.
//!
//! # Data Flow
//! ```text
//! RequestDraft + SigningIdentity + ResolvedOrigin + timestamp
//!     → canonical.rs (canonical request, scope, key derivation)
//!     → signer.rs (headers + authorization)
//!     → SignedRequest (terminal until transmission)
//!
//! Backend side:
//!     http::Request → verify.rs → same canonical.rs primitives → Ok / VerifyError
//! ```
//!
//! # Design Decisions
//! - AWS Signature Version 4 (`AWS4-HMAC-SHA256`), the scheme the
//!   function-URL backends validate
//! - Identity is loaded once per process and shared read-only

pub mod canonical;
pub mod identity;
pub mod signer;
pub mod verify;

pub use identity::{IdentityCell, SigningIdentity};
pub use signer::{RequestDraft, SignedRequest, Signer, SigningError};
pub use verify::{verify, VerifyError};
