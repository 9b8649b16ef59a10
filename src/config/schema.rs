//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration for the HTTP trigger adapter.
    pub listener: ListenerConfig,

    /// How the backend origin is chosen for each request.
    pub origin: OriginConfig,

    /// Request signing settings.
    pub signing: SigningConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest inbound body the adapter buffers before signing.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            // Matches the body size the delivery network hands to the trigger.
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Origin resolution strategy. Exactly one is active per deployment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum OriginConfig {
    /// The target authority is carried in an edge-injected request header.
    Header {
        /// Header name (case-insensitive).
        #[serde(default = "default_target_header")]
        header_name: String,

        /// Scheme used to reach the resolved authority.
        #[serde(default = "default_scheme")]
        scheme: String,
    },

    /// Every request goes to one statically configured backend URL.
    Static {
        /// Full invocation URL; only scheme, host and port are used.
        #[serde(default)]
        backend_url: Option<String>,
    },
}

impl Default for OriginConfig {
    fn default() -> Self {
        OriginConfig::Header {
            header_name: default_target_header(),
            scheme: default_scheme(),
        }
    }
}

fn default_target_header() -> String {
    "x-target-origin".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

/// Request signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Service name bound into the credential scope.
    pub service: String,

    /// Deployment region. Falls back to `AWS_REGION` when empty.
    pub region: String,

    /// Where the scope region comes from.
    pub region_policy: RegionPolicy,

    /// Where the credential comes from.
    pub credentials: CredentialsConfig,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            service: "lambda".to_string(),
            region: String::new(),
            region_policy: RegionPolicy::default(),
            credentials: CredentialsConfig::default(),
        }
    }
}

/// Selects the region used in the signature scope.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegionPolicy {
    /// Parse the region from the resolved backend host, else use the
    /// deployment region.
    #[default]
    Origin,
    /// Always use the deployment region.
    Deployment,
}

/// Credential source for the signing identity.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CredentialsConfig {
    /// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_SESSION_TOKEN`.
    #[default]
    Environment,
    /// Inline credentials. Intended for local testing only.
    Static {
        access_key_id: String,
        secret_access_key: String,
        #[serde(default)]
        session_token: Option<String>,
    },
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for the whole backend call, body included.
    pub invocation_ms: u64,

    /// Execution budget of the trigger that calls the handler. The
    /// invocation timeout must be strictly shorter.
    pub trigger_deadline_ms: u64,

    /// Connection establishment timeout.
    pub connect_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            invocation_ms: 9_000,
            trigger_deadline_ms: 10_000,
            connect_ms: 2_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
