//! Timeout enforcement.
//!
//! # Responsibilities
//! - Hold the outbound invocation deadline
//! - Guarantee it ends before the trigger's own execution budget
//! - Wrap the backend call so an overrun becomes a distinct error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time;

use crate::config::TimeoutConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invocation timeout {invocation:?} must be below trigger deadline {trigger_deadline:?}")]
pub struct BudgetError {
    pub invocation: Duration,
    pub trigger_deadline: Duration,
}

/// The call had not finished when its deadline passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0:?} elapsed")]
pub struct DeadlineElapsed(pub Duration);

/// Outbound deadline, strictly inside the trigger's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationBudget {
    invocation: Duration,
    trigger_deadline: Duration,
    connect: Duration,
}

impl InvocationBudget {
    pub fn new(
        invocation: Duration,
        trigger_deadline: Duration,
        connect: Duration,
    ) -> Result<Self, BudgetError> {
        if invocation.is_zero() || invocation >= trigger_deadline {
            return Err(BudgetError {
                invocation,
                trigger_deadline,
            });
        }
        Ok(Self {
            invocation,
            trigger_deadline,
            connect: connect.min(invocation),
        })
    }

    pub fn from_config(config: &TimeoutConfig) -> Result<Self, BudgetError> {
        Self::new(
            Duration::from_millis(config.invocation_ms),
            Duration::from_millis(config.trigger_deadline_ms),
            Duration::from_millis(config.connect_ms),
        )
    }

    pub fn invocation(&self) -> Duration {
        self.invocation
    }

    pub fn trigger_deadline(&self) -> Duration {
        self.trigger_deadline
    }

    pub fn connect(&self) -> Duration {
        self.connect
    }

    /// Run `future` under the invocation deadline.
    ///
    /// Dropping the returned future drops `future` with it.
    pub async fn run<F, T>(&self, future: F) -> Result<T, DeadlineElapsed>
    where
        F: Future<Output = T>,
    {
        time::timeout(self.invocation, future)
            .await
            .map_err(|_| DeadlineElapsed(self.invocation))
    }
}
