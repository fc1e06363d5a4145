//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forward_auth_decisions_total` (counter): decisions by route, outcome (allow/deny/error)
//! - `forward_auth_decision_duration_seconds` (histogram): authorization round trip
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one authorization decision.
pub fn record_decision(route: &str, outcome: &'static str, started: Instant) {
    let labels = [("route", route.to_string()), ("outcome", outcome.to_string())];
    counter!("forward_auth_decisions_total", &labels).increment(1);
    histogram!("forward_auth_decision_duration_seconds", &labels)
        .record(started.elapsed().as_secs_f64());
}

/// Record one completed client request.
pub fn record_request(method: &str, status: u16, route: &str, started: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);
    histogram!("gateway_request_duration_seconds", &labels)
        .record(started.elapsed().as_secs_f64());
}
