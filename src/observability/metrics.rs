//! Metrics collection and exposition.
//!
//! # Metrics
//! - `technica_http_requests_total` (counter): requests by method, path, status
//! - `technica_http_request_duration_seconds` (histogram)
//! - `technica_rpc_requests_total` (counter): JSON-RPC calls by operation, outcome
//! - `technica_rpc_duration_seconds` (histogram)
//! - `technica_chain_healthy` (gauge): 1=node reachable, 0=unreachable
//! - `technica_transactions_total` (counter): submissions by outcome
//! - `technica_next_nonce` (gauge)
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("technica_http_requests_total", &labels).increment(1);
    histogram!("technica_http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rpc_call(operation: &'static str, outcome: &'static str, start: Instant) {
    counter!("technica_rpc_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    histogram!("technica_rpc_duration_seconds", "operation" => operation)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_chain_health(healthy: bool) {
    gauge!("technica_chain_healthy").set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_transaction(outcome: &'static str) {
    counter!("technica_transactions_total", "outcome" => outcome).increment(1);
}

pub fn record_next_nonce(nonce: u64) {
    gauge!("technica_next_nonce").set(nonce as f64);
}
