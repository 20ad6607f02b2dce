//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define resolver metrics (outcomes, latency, degraded lookups)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `redirect_resolutions_total` (counter): resolutions by outcome
//! - `redirect_resolve_duration_seconds` (histogram): resolution latency
//! - `redirect_pattern_errors_total` (counter): malformed rule/exclude patterns
//! - `redirect_store_errors_total` (counter): failed rule store queries
//! - `redirect_http_requests_total` (counter): dispatcher responses by status
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, CLI)
//! - Labels are small closed sets, never request paths

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished resolution.
pub fn record_resolution(outcome: &'static str, start: Instant) {
    metrics::counter!("redirect_resolutions_total", "outcome" => outcome).increment(1);
    metrics::histogram!("redirect_resolve_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a pattern that failed to compile (`rule` or `exclude`).
pub fn record_pattern_error(kind: &'static str) {
    metrics::counter!("redirect_pattern_errors_total", "kind" => kind).increment(1);
}

/// Record a failed rule store query (`exact` or `pattern`).
pub fn record_store_error(query: &'static str) {
    metrics::counter!("redirect_store_errors_total", "query" => query).increment(1);
}

/// Record a dispatcher response.
pub fn record_http_request(status: u16) {
    metrics::counter!("redirect_http_requests_total", "status" => status.to_string()).increment(1);
}
