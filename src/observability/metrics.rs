//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (requests, latency, connections)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `httpd_requests_total` (counter): total requests by method, status, route
//! - `httpd_request_duration_seconds` (histogram): pipeline latency by route
//! - `httpd_active_connections` (gauge): current connection count
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels for method, route, status code

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`. Needs a running Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, route: &'static str, start: Instant) {
    metrics::counter!(
        "httpd_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route,
    )
    .increment(1);
    metrics::histogram!("httpd_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Publish the live connection count.
pub fn set_active_connections(count: u64) {
    metrics::gauge!("httpd_active_connections").set(count as f64);
}
