//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level from config, overridable with `RUST_LOG`
//!
//! # Design Decisions
//! - JSON format for production, pretty format for development
//! - Logs go to stderr so the event subcommand can own stdout

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber.
pub fn init_logging(
    config: &ObservabilityConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("edge_gateway={},tower_http=info", config.log_level))
    });

    let (json, pretty) = match config.log_format {
        LogFormat::Json => (
            Some(fmt::layer().json().with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Pretty => (
            None,
            Some(fmt::layer().pretty().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .try_init()
}
