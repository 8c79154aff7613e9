//! Metrics implementation using Prometheus.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use shopseeker_core::{Error, Result};

/// Initialize Prometheus recorder and return the handle.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::internal(format!("Failed to install Prometheus recorder: {}", e)))?;

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(handle)
}

/// Track one analysis call (count, latency, shops found).
pub fn track_analysis(outcome: &'static str, latency_sec: f64, shops: usize) {
    metrics::counter!("analysis_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("analysis_duration_seconds", "outcome" => outcome).record(latency_sec);
    if outcome == "success" {
        metrics::histogram!("analysis_shops_found").record(shops as f64);
    }
}

/// Track an ingested image by media type.
pub fn track_ingest(media_type: &str, size_bytes: usize) {
    metrics::counter!("images_ingested_total", "media_type" => media_type.to_string()).increment(1);
    metrics::histogram!("image_size_bytes").record(size_bytes as f64);
}
