//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rotation_selections_total` (counter): selections by group, outcome
//! - `rotation_resolutions_total` (counter): resolutions by category, path
//! - `rotation_endpoint_errors_total` (counter): reported failures
//! - `rotation_rate_limited_total` (counter): rate-limit signals
//! - `rotation_recoveries_total` (counter): scheduled recoveries by outcome
//! - `rotation_endpoint_available` (gauge): 1=available, 0=not
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::health::state::RecoveryOutcome;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_selection(group: &str, success: bool) {
    let outcome = if success { "selected" } else { "unavailable" };
    counter!("rotation_selections_total", "group" => group.to_string(), "outcome" => outcome).increment(1);
}

/// `path` is `primary`, `fallback` or `exhausted`.
pub fn record_resolution(category: &str, path: &'static str) {
    counter!("rotation_resolutions_total", "category" => category.to_string(), "path" => path).increment(1);
}

pub fn record_endpoint_error(group: &str, endpoint: &str) {
    counter!(
        "rotation_endpoint_errors_total",
        "group" => group.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

pub fn record_rate_limited(group: &str, endpoint: &str) {
    counter!(
        "rotation_rate_limited_total",
        "group" => group.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

pub fn record_recovery(group: &str, endpoint: &str, outcome: RecoveryOutcome) {
    counter!(
        "rotation_recoveries_total",
        "group" => group.to_string(),
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_endpoint_available(group: &str, endpoint: &str, available: bool) {
    gauge!(
        "rotation_endpoint_available",
        "group" => group.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .set(if available { 1.0 } else { 0.0 });
}
