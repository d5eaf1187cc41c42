//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, status
//! - `gateway_upstream_duration_seconds` (histogram): engine latency by route
//! - `gateway_override_retries_total` (counter): channel updates retried with override
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, status: u16) {
    metrics::counter!(
        "gateway_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_upstream_latency(route: &'static str, start: Instant) {
    metrics::histogram!("gateway_upstream_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_override_retry() {
    metrics::counter!("gateway_override_retries_total").increment(1);
}
