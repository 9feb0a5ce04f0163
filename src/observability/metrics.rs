//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by mount, endpoint, status
//! - `gateway_request_duration_seconds` (histogram): latency by mount, endpoint
//! - `gateway_upstream_errors_total` (counter): transport failures by kind
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Endpoint labels come from the allow-list only, never raw client input

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed gateway request.
pub fn record_request(mount: &str, endpoint: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "mount" => mount.to_string(),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "mount" => mount.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a failure talking to the backend.
pub fn record_upstream_error(kind: &'static str) {
    counter!("gateway_upstream_errors_total", "kind" => kind).increment(1);
}
