//! Metrics implementation using Prometheus.

use concierge_core::{Error, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize Prometheus recorder and return the handle.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::governance(format!("Failed to install Prometheus recorder: {}", e)))?;

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(handle)
}

/// Count a completed chat turn by intent label.
pub fn track_chat(intent: &str, clarified: bool) {
    metrics::counter!(
        "chat_requests_total",
        "intent" => intent.to_string(),
        "clarified" => clarified.to_string()
    )
    .increment(1);
}

/// Track one forwarded provider call (count and latency).
pub fn track_provider_request(operation: &'static str, status: u16, latency_sec: f64) {
    metrics::counter!(
        "provider_requests_total",
        "operation" => operation,
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "provider_request_duration_seconds",
        "operation" => operation
    )
    .record(latency_sec);
}
