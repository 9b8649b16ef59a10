//! Origin resolution.
//!
//! # Responsibilities
//! - Decide which backend authority serves a request
//! - Explicit-target strategy: read an edge-injected header
//! - Static strategy: use the backend URL loaded at cold start
//!
//! # Design Decisions
//! - Strategy is a tagged enum picked once from config, never mixed
//! - Resolution is pure: no network calls, never reads the body
//! - Failure is explicit; there is no fallback authority

use std::fmt;
use std::str::FromStr;

use axum::http::uri::{Authority, Scheme};
use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::OriginConfig;
use crate::http::request::InboundRequest;

/// Why a request could not be routed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The explicit-target header was absent or empty.
    #[error("target origin header '{0}' missing or empty")]
    MissingTarget(String),

    /// The explicit-target header did not hold a bare authority.
    #[error("target origin '{0}' is not a valid authority")]
    InvalidTarget(String),

    /// Static strategy without a backend URL.
    #[error("no static backend URL configured")]
    Unconfigured,
}

impl ResolutionError {
    /// Whether the error points at deployment misconfiguration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ResolutionError::Unconfigured)
    }
}

/// A single backend, as scheme plus authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOrigin {
    scheme: Scheme,
    authority: Authority,
}

impl ResolvedOrigin {
    pub fn new(scheme: Scheme, authority: Authority) -> Self {
        Self { scheme, authority }
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Host without port, lower-cased.
    pub fn host(&self) -> String {
        self.authority.host().to_ascii_lowercase()
    }

    /// Region embedded in well-known AWS endpoint host names.
    ///
    /// Recognises `<id>.lambda-url.<region>.on.aws` and
    /// `<service>.<region>.amazonaws.com`.
    pub fn region_hint(&self) -> Option<String> {
        let host = self.host();
        let labels: Vec<&str> = host.split('.').collect();

        if let Some(pos) = labels.iter().position(|l| *l == "lambda-url") {
            let tail = &labels[pos + 1..];
            if tail.len() == 3 && tail[1] == "on" && tail[2] == "aws" && !tail[0].is_empty() {
                return Some(tail[0].to_string());
            }
        }

        if labels.len() >= 4 && labels[labels.len() - 2..] == ["amazonaws", "com"] {
            let region = labels[labels.len() - 3];
            if looks_like_region(region) {
                return Some(region.to_string());
            }
        }

        None
    }
}

impl fmt::Display for ResolvedOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

fn looks_like_region(label: &str) -> bool {
    let parts: Vec<&str> = label.split('-').collect();
    parts.len() >= 3
        && parts.last().is_some_and(|p| p.chars().all(|c| c.is_ascii_digit()))
        && parts.iter().all(|p| !p.is_empty())
}

/// The active resolution strategy.
#[derive(Debug, Clone)]
pub enum OriginResolver {
    /// Authority comes from an edge-injected header.
    ExplicitTarget { header: HeaderName, scheme: Scheme },
    /// Authority fixed at cold start; `None` when never configured.
    StaticDefault { origin: Option<ResolvedOrigin> },
}

/// Error building a resolver from configuration.
#[derive(Debug, Error)]
pub enum ResolverConfigError {
    #[error("invalid target header name '{0}'")]
    HeaderName(String),

    #[error("unsupported scheme '{0}'")]
    Scheme(String),

    #[error("invalid backend URL '{0}'")]
    BackendUrl(String),
}

impl OriginResolver {
    /// Build the strategy selected by configuration.
    pub fn from_config(config: &OriginConfig) -> Result<Self, ResolverConfigError> {
        match config {
            OriginConfig::Header { header_name, scheme } => {
                let header = HeaderName::from_bytes(header_name.trim().as_bytes())
                    .map_err(|_| ResolverConfigError::HeaderName(header_name.clone()))?;
                Ok(OriginResolver::ExplicitTarget {
                    header,
                    scheme: parse_scheme(scheme)?,
                })
            }
            OriginConfig::Static { backend_url: None } => {
                Ok(OriginResolver::StaticDefault { origin: None })
            }
            OriginConfig::Static { backend_url: Some(raw) } => {
                let origin = origin_from_url(raw)?;
                Ok(OriginResolver::StaticDefault { origin: Some(origin) })
            }
        }
    }

    /// Header carrying the target, when the explicit strategy is active.
    pub fn target_header(&self) -> Option<&HeaderName> {
        match self {
            OriginResolver::ExplicitTarget { header, .. } => Some(header),
            OriginResolver::StaticDefault { .. } => None,
        }
    }

    /// Short strategy name for logs.
    pub fn strategy(&self) -> &'static str {
        match self {
            OriginResolver::ExplicitTarget { .. } => "explicit_target",
            OriginResolver::StaticDefault { .. } => "static_default",
        }
    }

    /// Resolve the backend for one request.
    pub fn resolve(&self, request: &InboundRequest) -> Result<ResolvedOrigin, ResolutionError> {
        match self {
            OriginResolver::ExplicitTarget { header, scheme } => {
                let raw = request
                    .headers()
                    .get(header)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .unwrap_or_default();

                if raw.is_empty() {
                    return Err(ResolutionError::MissingTarget(header.to_string()));
                }

                let authority = parse_authority(raw)
                    .ok_or_else(|| ResolutionError::InvalidTarget(raw.to_string()))?;
                Ok(ResolvedOrigin::new(scheme.clone(), authority))
            }
            OriginResolver::StaticDefault { origin } => {
                origin.clone().ok_or(ResolutionError::Unconfigured)
            }
        }
    }
}

/// Accepts `host` or `host:port`; anything with userinfo, path or scheme
/// is refused.
fn parse_authority(raw: &str) -> Option<Authority> {
    if raw.contains(['/', '@', '?', '#', ' ']) {
        return None;
    }
    let authority = Authority::from_str(&raw.to_ascii_lowercase()).ok()?;
    if authority.host().is_empty() {
        return None;
    }
    Some(authority)
}

fn parse_scheme(raw: &str) -> Result<Scheme, ResolverConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "https" => Ok(Scheme::HTTPS),
        "http" => Ok(Scheme::HTTP),
        _ => Err(ResolverConfigError::Scheme(raw.to_string())),
    }
}

fn origin_from_url(raw: &str) -> Result<ResolvedOrigin, ResolverConfigError> {
    let url = Url::parse(raw.trim()).map_err(|_| ResolverConfigError::BackendUrl(raw.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| ResolverConfigError::BackendUrl(raw.to_string()))?;
    let scheme = parse_scheme(url.scheme())?;

    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let authority = parse_authority(&authority)
        .ok_or_else(|| ResolverConfigError::BackendUrl(raw.to_string()))?;

    Ok(ResolvedOrigin::new(scheme, authority))
}
