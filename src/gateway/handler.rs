//! Edge gateway handler.
//!
//! # States
//! ```text
//! Received → Resolving → Signing → Invoking → Completed
//!                │           │          │
//!                ▼           ▼          ▼
//!            Rejected    Rejected     Failed
//!              (502)       (500)       (504)
//! ```
//!
//! # Design Decisions
//! - Each stage returns a `Result`; the first error ends the request
//! - `Rejected` never touched the network, `Failed` did
//! - Any backend status is `Completed`; the handler is a relay
//! - Stateless between calls; only the identity and config are shared

use std::fmt;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::http::client::{BackendClient, ClientBuildError, InvocationError};
use crate::http::request::InboundRequest;
use crate::http::response::{BackendResponse, EdgeResponse};
use crate::observability::metrics;
use crate::resilience::{BudgetError, InvocationBudget};
use crate::routing::{OriginResolver, ResolutionError, ResolverConfigError};
use crate::signing::{IdentityCell, RequestDraft, Signer, SigningError};

/// Position in the request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Resolving,
    Signing,
    Invoking,
    Completed,
    Rejected,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Resolving => "resolving",
            Stage::Signing => "signing",
            Stage::Invoking => "invoking",
            Stage::Completed => "completed",
            Stage::Rejected => "rejected",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure before any network activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Signing(#[from] SigningError),
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::Resolution(_) => StatusCode::BAD_GATEWAY,
            Rejection::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Rejection::Resolution(_) => "Unable to resolve origin",
            Rejection::Signing(_) => "Unable to sign origin request",
        }
    }

    fn is_configuration(&self) -> bool {
        match self {
            Rejection::Resolution(e) => e.is_configuration(),
            Rejection::Signing(e) => matches!(e, SigningError::InvalidIdentity(_)),
        }
    }
}

/// Terminal state of one request.
#[derive(Debug)]
pub enum Outcome {
    Completed(BackendResponse),
    Rejected(Rejection),
    Failed(InvocationError),
}

impl Outcome {
    pub fn stage(&self) -> Stage {
        match self {
            Outcome::Completed(_) => Stage::Completed,
            Outcome::Rejected(_) => Stage::Rejected,
            Outcome::Failed(_) => Stage::Failed,
        }
    }

    /// Project onto the response the edge relays.
    pub fn into_response(self) -> EdgeResponse {
        match self {
            Outcome::Completed(response) => EdgeResponse::from_backend(response),
            Outcome::Rejected(rejection) => EdgeResponse::error(rejection.status(), rejection.message()),
            Outcome::Failed(_) => EdgeResponse::error(StatusCode::GATEWAY_TIMEOUT, "Origin did not respond"),
        }
    }
}

/// Error assembling the handler at cold start.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    #[error(transparent)]
    Resolver(#[from] ResolverConfigError),

    #[error(transparent)]
    Budget(#[from] BudgetError),

    #[error(transparent)]
    Client(#[from] ClientBuildError),
}

/// Process-wide handler; share it behind an `Arc`.
pub struct EdgeHandler {
    resolver: OriginResolver,
    signer: Signer,
    identity: Arc<IdentityCell>,
    client: BackendClient,
    clock: fn() -> SystemTime,
}

impl EdgeHandler {
    /// Assemble the handler from validated configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, HandlerBuildError> {
        let identity = Arc::new(IdentityCell::new(config.signing.clone()));
        Self::with_identity(config, identity)
    }

    /// Assemble the handler around an existing identity cell.
    pub fn with_identity(
        config: &GatewayConfig,
        identity: Arc<IdentityCell>,
    ) -> Result<Self, HandlerBuildError> {
        let resolver = OriginResolver::from_config(&config.origin)?;
        let budget = InvocationBudget::from_config(&config.timeouts)?;
        let client = BackendClient::new(budget)?;
        let signer = Signer::new(config.signing.service.clone(), config.signing.region_policy);

        Ok(Self {
            resolver,
            signer,
            identity,
            client,
            clock: SystemTime::now,
        })
    }

    /// Replace the signing clock.
    pub fn with_clock(mut self, clock: fn() -> SystemTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn resolver(&self) -> &OriginResolver {
        &self.resolver
    }

    pub fn budget(&self) -> &InvocationBudget {
        self.client.budget()
    }

    /// Handle one request and produce the edge response.
    pub async fn handle(&self, request: InboundRequest) -> EdgeResponse {
        let started = Instant::now();
        let method = request.method().to_string();
        let outcome = self.process(request).await;
        let stage = outcome.stage();
        let response = outcome.into_response();

        metrics::record_request(&method, response.status.as_u16(), stage, started);
        response
    }

    /// Run the state machine and return the terminal outcome.
    pub async fn process(&self, request: InboundRequest) -> Outcome {
        let request_id = request
            .request_id()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut stage = Stage::Received;
        tracing::debug!(
            request_id = %request_id,
            stage = %stage,
            method = %request.method(),
            path = %request.path(),
            "Request received"
        );

        stage = Stage::Resolving;
        let origin = match self.resolver.resolve(&request) {
            Ok(origin) => origin,
            Err(e) => return self.reject(&request_id, stage, e.into()),
        };

        stage = Stage::Signing;
        let identity = self.identity.get();
        let draft = RequestDraft::from_inbound(&request, self.resolver.target_header());
        let signed = match self.signer.sign(draft, &identity, &origin, (self.clock)()) {
            Ok(signed) => signed,
            Err(e) => return self.reject(&request_id, stage, e.into()),
        };

        stage = Stage::Invoking;
        tracing::debug!(
            request_id = %request_id,
            stage = %stage,
            origin = %origin,
            scope = %signed.credential_scope(),
            "Invoking origin"
        );

        match self.client.invoke(signed).await {
            Ok(response) => {
                tracing::info!(
                    request_id = %request_id,
                    stage = %Stage::Completed,
                    origin = %origin,
                    status = response.status.as_u16(),
                    latency_ms = response.latency.as_millis() as u64,
                    "Origin responded"
                );
                metrics::record_backend_latency(response.latency);
                Outcome::Completed(response)
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    stage = %Stage::Failed,
                    origin = %origin,
                    error = %e,
                    "Origin invocation failed"
                );
                Outcome::Failed(e)
            }
        }
    }

    fn reject(&self, request_id: &str, stage: Stage, rejection: Rejection) -> Outcome {
        if rejection.is_configuration() {
            tracing::error!(
                request_id = %request_id,
                stage = %stage,
                strategy = self.resolver.strategy(),
                error = %rejection,
                "Request rejected: gateway misconfigured"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                stage = %stage,
                error = %rejection,
                "Request rejected"
            );
        }
        Outcome::Rejected(rejection)
    }
}

impl fmt::Debug for EdgeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeHandler")
            .field("strategy", &self.resolver.strategy())
            .field("service", &self.signer.service())
            .field("budget", self.client.budget())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_status_mapping() {
        let resolution = Rejection::from(ResolutionError::MissingTarget("x-target-origin".into()));
        assert_eq!(resolution.status(), StatusCode::BAD_GATEWAY);
        assert!(!resolution.is_configuration());

        let unconfigured = Rejection::from(ResolutionError::Unconfigured);
        assert_eq!(unconfigured.status(), StatusCode::BAD_GATEWAY);
        assert!(unconfigured.is_configuration());

        let signing = Rejection::from(SigningError::InvalidIdentity("region is empty"));
        assert_eq!(signing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(signing.is_configuration());

        assert_eq!(
            Rejection::from(SigningError::ClockSkew).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_outcome_responses() {
        let failed = Outcome::Failed(InvocationError::Timeout(100));
        assert_eq!(failed.stage(), Stage::Failed);
        assert_eq!(failed.into_response().status, StatusCode::GATEWAY_TIMEOUT);

        let rejected = Outcome::Rejected(ResolutionError::Unconfigured.into());
        assert_eq!(rejected.stage(), Stage::Rejected);
        assert_eq!(rejected.into_response().status, StatusCode::BAD_GATEWAY);
    }
}
