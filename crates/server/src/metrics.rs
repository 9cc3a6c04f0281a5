//! Prometheus metrics for observability.
//!
//! This module provides the HTTP request metrics of the Transmute server and
//! registers them together with the core engine, detection and conversion
//! metrics in one registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "transmute_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("transmute_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "transmute_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Files currently selected (collected dynamically).
pub static FILES_SELECTED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "transmute_files_selected",
        "Number of files in the session",
    )
    .unwrap()
});

/// Engine readiness (1 = ready, 0 = not loaded).
pub static ENGINE_READY: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "transmute_engine_ready",
        "Whether the transcoding engine is loaded (1) or not (0)",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Session
    registry.register(Box::new(FILES_SELECTED.clone())).unwrap();
    registry.register(Box::new(ENGINE_READY.clone())).unwrap();

    // Core metrics (engine, detection, conversion)
    for metric in transmute_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Collect dynamic metrics from current application state.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    FILES_SELECTED.set(state.files().len().await as i64);
    ENGINE_READY.set(if state.session().is_ready().await { 1 } else { 0 });
}

static FILE_SEGMENT_RE: Lazy<Option<regex_lite::Regex>> =
    Lazy::new(|| regex_lite::Regex::new(r"/files/[^/]+").ok());
static FORMAT_SEGMENT_RE: Lazy<Option<regex_lite::Regex>> =
    Lazy::new(|| regex_lite::Regex::new(r"/formats/[^/]+/targets").ok());

/// Normalize a path for metric labels (replace file names and extensions
/// with placeholders).
pub fn normalize_path(path: &str) -> String {
    let mut result = path.to_string();
    if let Some(re) = FILE_SEGMENT_RE.as_ref() {
        result = re.replace_all(&result, "/files/{name}").to_string();
    }
    if let Some(re) = FORMAT_SEGMENT_RE.as_ref() {
        result = re.replace_all(&result, "/formats/{ext}/targets").to_string();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_file_name() {
        let path = "/api/v1/files/holiday%20clip.mov";
        assert_eq!(normalize_path(path), "/api/v1/files/{name}");
    }

    #[test]
    fn test_normalize_path_file_action() {
        let path = "/api/v1/files/clip.mov/download";
        assert_eq!(normalize_path(path), "/api/v1/files/{name}/download");
    }

    #[test]
    fn test_normalize_path_targets() {
        let path = "/api/v1/formats/mp3/targets";
        assert_eq!(normalize_path(path), "/api/v1/formats/{ext}/targets");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(normalize_path("/api/v1/files"), "/api/v1/files");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("transmute_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        transmute_core::metrics::ENGINE_LOADS
            .with_label_values(&["success"])
            .inc();
        transmute_core::metrics::CONVERSIONS_TOTAL
            .with_label_values(&["video", "success"])
            .inc();
        ENGINE_READY.set(0);

        let output = encode_metrics();

        assert!(output.contains("transmute_engine_loads_total"));
        assert!(output.contains("transmute_conversions_total"));
        assert!(output.contains("transmute_engine_ready"));
    }
}
