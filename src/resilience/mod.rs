//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → timeouts.rs (enforce invocation deadline inside the trigger budget)
//!     → on overrun: Failed state, 504
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - At most one backend call per request; retries belong to the
//!   delivery network in front of the gateway

pub mod timeouts;

pub use timeouts::{BudgetError, DeadlineElapsed, InvocationBudget};
