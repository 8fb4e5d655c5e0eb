//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route kind, status
//! - `gateway_request_duration_seconds` (histogram): latency by route kind
//! - `gateway_ws_sessions_active` (gauge): live relay sessions
//! - `gateway_ws_messages_relayed_total` (counter): feed messages forwarded

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn ws_session_opened() {
    metrics::gauge!("gateway_ws_sessions_active").increment(1.0);
}

pub fn ws_session_closed() {
    metrics::gauge!("gateway_ws_sessions_active").decrement(1.0);
}

pub fn ws_message_relayed() {
    metrics::counter!("gateway_ws_messages_relayed_total").increment(1);
}
