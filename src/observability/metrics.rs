//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_admitted_total` (counter)
//! - `gateway_requests_rejected_total` (counter)
//! - `gateway_records_swept_total` (counter)
//! - `gateway_registry_size` (gauge): identities currently tracked

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics exporter"),
    }
}

/// Record an admitted request on a throttled path.
pub fn record_admitted() {
    counter!("gateway_requests_admitted_total").increment(1);
}

/// Record a rejected (429) request.
pub fn record_rejected() {
    counter!("gateway_requests_rejected_total").increment(1);
}

/// Record a sweep pass over the registry.
pub fn record_sweep(removed: usize, remaining: usize) {
    counter!("gateway_records_swept_total").increment(removed as u64);
    gauge!("gateway_registry_size").set(remaining as f64);
}
