//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, invocation below trigger deadline)
//! - Check that names and URLs parse the way the runtime will parse them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, OriginConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.invocation_ms ({invocation_ms}) must be below timeouts.trigger_deadline_ms ({deadline_ms})")]
    InvocationNotBelowDeadline { invocation_ms: u64, deadline_ms: u64 },

    #[error("origin.header_name '{0}' is not a valid header name")]
    InvalidHeaderName(String),

    #[error("origin scheme '{0}' is not http or https")]
    UnsupportedScheme(String),

    #[error("origin.backend_url '{0}' is not a valid URL with a host")]
    InvalidBackendUrl(String),

    #[error("signing.service must not be empty")]
    EmptyService,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let timeouts = &config.timeouts;
    if timeouts.invocation_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("invocation_ms"));
    }
    if timeouts.trigger_deadline_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("trigger_deadline_ms"));
    }
    if timeouts.connect_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_ms"));
    }
    if timeouts.invocation_ms >= timeouts.trigger_deadline_ms {
        errors.push(ValidationError::InvocationNotBelowDeadline {
            invocation_ms: timeouts.invocation_ms,
            deadline_ms: timeouts.trigger_deadline_ms,
        });
    }

    match &config.origin {
        OriginConfig::Header { header_name, scheme } => {
            if HeaderName::from_bytes(header_name.trim().as_bytes()).is_err() {
                errors.push(ValidationError::InvalidHeaderName(header_name.clone()));
            }
            if !is_supported_scheme(scheme) {
                errors.push(ValidationError::UnsupportedScheme(scheme.clone()));
            }
        }
        // An absent URL is legal here; it surfaces per request instead.
        OriginConfig::Static { backend_url: Some(raw) } => match Url::parse(raw.trim()) {
            Ok(url) if url.host_str().is_some() => {
                if !is_supported_scheme(url.scheme()) {
                    errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
                }
            }
            _ => errors.push(ValidationError::InvalidBackendUrl(raw.clone())),
        },
        OriginConfig::Static { backend_url: None } => {}
    }

    if config.signing.service.trim().is_empty() {
        errors.push(ValidationError::EmptyService);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_supported_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}
