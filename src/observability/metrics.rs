//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_gateway_requests_total` (counter): requests by method, status, stage
//! - `edge_gateway_request_duration_seconds` (histogram): handler latency by stage
//! - `edge_gateway_backend_latency_seconds` (histogram): backend call latency
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels stay low-cardinality; origins are logged, not labelled

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::gateway::Stage;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, stage: Stage, started: Instant) {
    counter!(
        "edge_gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "stage" => stage.as_str()
    )
    .increment(1);

    histogram!(
        "edge_gateway_request_duration_seconds",
        "stage" => stage.as_str()
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record how long the backend took to answer.
pub fn record_backend_latency(latency: Duration) {
    histogram!("edge_gateway_backend_latency_seconds").record(latency.as_secs_f64());
}
