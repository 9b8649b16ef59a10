//! Cold start.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the resolver, signer, identity cell and backend client once
//! - Warn loudly about a deployment that can only reject requests
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The identity itself is loaded on first use, not here

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{self, ConfigError, GatewayConfig};
use crate::gateway::{EdgeHandler, HandlerBuildError};
use crate::routing::OriginResolver;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Handler(#[from] HandlerBuildError),
}

/// Load configuration from `path`, or defaults plus environment.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig, StartupError> {
    let config = match path {
        Some(path) => config::load_config(path)?,
        None => config::load_from_env()?,
    };
    Ok(config)
}

/// Build the shared handler from validated configuration.
pub fn cold_start(config: &GatewayConfig) -> Result<Arc<EdgeHandler>, StartupError> {
    let handler = EdgeHandler::from_config(config)?;

    if let OriginResolver::StaticDefault { origin: None } = handler.resolver() {
        tracing::warn!(
            variable = config::loader::BACKEND_URL_ENV,
            "Static origin strategy has no backend URL; every request will be rejected"
        );
    }

    tracing::info!(
        strategy = handler.resolver().strategy(),
        service = %config.signing.service,
        region_policy = ?config.signing.region_policy,
        invocation_ms = config.timeouts.invocation_ms,
        trigger_deadline_ms = config.timeouts.trigger_deadline_ms,
        "Gateway initialised"
    );

    Ok(Arc::new(handler))
}
