//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): parsed requests by method
//! - `http_request_body_bytes` (histogram): body size of parsed requests
//! - `http_parse_errors_total` (counter): rejected requests by error kind
//! - `http_responses_total` (counter): responses written by status
//! - `http_active_connections` (gauge): live connection tasks
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &'static str, body_len: usize) {
    counter!("http_requests_total", "method" => method).increment(1);
    histogram!("http_request_body_bytes").record(body_len as f64);
}

pub fn record_parse_error(kind: &'static str) {
    counter!("http_parse_errors_total", "kind" => kind).increment(1);
}

pub fn record_response(status: u16) {
    counter!("http_responses_total", "status" => status.to_string()).increment(1);
}

pub fn set_active_connections(count: u64) {
    gauge!("http_active_connections").set(count as f64);
}
