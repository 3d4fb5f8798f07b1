//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mole_requests_total` (counter): requests by method, status, route
//! - `mole_request_duration_seconds` (histogram): handling time by route, delay included
//! - `mole_hop_duration_seconds` (histogram): time spent in proxy hops
//! - `mole_response_reloads_total` (counter): response file reloads by outcome
//!
//! Recording is a no-op until a recorder is installed, so library users and tests pay
//! nothing unless the exporter is enabled.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &'static str, start: Instant) {
    counter!(
        "mole_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route
    )
    .increment(1);
    histogram!("mole_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_hop(elapsed: Duration) {
    histogram!("mole_hop_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_reload(outcome: &'static str) {
    counter!("mole_response_reloads_total", "outcome" => outcome).increment(1);
}
