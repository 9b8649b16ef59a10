//! Signing edge gateway library.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;
pub mod signing;
pub mod trigger;

pub use config::schema::GatewayConfig;
pub use gateway::EdgeHandler;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
