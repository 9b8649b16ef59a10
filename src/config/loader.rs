//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, OriginConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable carrying the static backend URL.
pub const BACKEND_URL_ENV: &str = "EDGE_GATEWAY_BACKEND_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    finish(config, |key| std::env::var(key).ok())
}

/// Build configuration from defaults plus the environment.
///
/// Without a file, a backend URL in the environment selects the static
/// strategy; otherwise the header strategy default stands.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    from_env(|key| std::env::var(key).ok())
}

fn from_env<F>(env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = GatewayConfig::default();
    if backend_url(&env).is_some() {
        config.origin = OriginConfig::Static { backend_url: None };
    }
    finish(config, env)
}

fn backend_url<F>(env: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    env(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty())
}

fn finish<F>(mut config: GatewayConfig, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env(&mut config, env);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay values that the provisioning layer hands over as environment.
///
/// A backend URL in the environment selects the static strategy only when
/// the file did not already pick one with a URL.
fn apply_env<F>(config: &mut GatewayConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let Some(url) = backend_url(&env) else {
        return;
    };

    match &mut config.origin {
        OriginConfig::Static { backend_url } if backend_url.is_none() => {
            *backend_url = Some(url);
        }
        OriginConfig::Static { .. } => {}
        OriginConfig::Header { .. } => {
            tracing::debug!(
                variable = BACKEND_URL_ENV,
                "Ignoring static backend URL, header strategy is configured"
            );
        }
    }
}
