//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define dispatch metrics (throughput, latency, handler panics)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): dispatches by method, outcome
//! - `dispatch_duration_seconds` (histogram): time from first match to outcome
//! - `dispatch_handler_panics_total` (counter): units that panicked
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Labels are low-cardinality (method, outcome); paths are never labels

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished dispatch.
pub fn record_dispatch(method: &str, outcome: &'static str, start: Instant) {
    let labels = [("method", method.to_string()), ("outcome", outcome.to_string())];
    metrics::counter!("dispatch_requests_total", &labels).increment(1);
    metrics::histogram!("dispatch_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_handler_panic() {
    metrics::counter!("dispatch_handler_panics_total").increment(1);
}
