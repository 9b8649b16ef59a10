//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or defaults
//!     → loader.rs (parse, deserialize, environment overlay)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → consumed once at cold start
//! ```
//!
//! # Design Decisions
//! - Config is read once at cold start; never re-read mid-request
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    CredentialsConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    OriginConfig, RegionPolicy, SigningConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
