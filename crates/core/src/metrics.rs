//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Engine session (loads, command durations)
//! - Format detection
//! - Conversions

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Engine Metrics
// =============================================================================

/// Engine loads total by result.
pub static ENGINE_LOADS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("transmute_engine_loads_total", "Total engine load attempts"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Engine command duration in seconds.
pub static ENGINE_EXEC_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "transmute_engine_exec_duration_seconds",
            "Duration of engine commands",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["result"], // "success", "failed", "timeout"
    )
    .unwrap()
});

// =============================================================================
// Detection and Conversion Metrics
// =============================================================================

/// Format detections total by result.
pub static DETECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("transmute_detections_total", "Total format detections"),
        &["result"], // "detected", "undetermined"
    )
    .unwrap()
});

/// Conversions total by target family and result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("transmute_conversions_total", "Total conversion attempts"),
        &["family", "result"], // result: "success", "failed", "rejected", "not_ready"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ENGINE_LOADS.clone()),
        Box::new(ENGINE_EXEC_DURATION.clone()),
        Box::new(DETECTIONS_TOTAL.clone()),
        Box::new(CONVERSIONS_TOTAL.clone()),
    ]
}
