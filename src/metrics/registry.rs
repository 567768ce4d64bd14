// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_gauge_vec_with_registry,
    register_histogram_vec_with_registry, CounterVec, Encoder, GaugeVec, HistogramVec, Opts,
    Registry, TextEncoder,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================

    /// Total number of API requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("requests_total", "Total number of API requests"),
        &["method", "endpoint", "status_code"],
        REGISTRY
    ).unwrap();

    /// Request duration histogram
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("request_duration_seconds", "Request duration in seconds")
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 90.0]),
        &["method", "endpoint", "status_code"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // IMAGEFX API METRICS
    // ============================================================================

    /// Total ImageFX API calls by operation (generate, upload)
    pub static ref IMAGEFX_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("imagefx_api_calls_total", "Total ImageFX API calls"),
        &["operation", "status_code"],
        REGISTRY
    ).unwrap();

    /// ImageFX API call duration
    pub static ref IMAGEFX_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("imagefx_api_duration_seconds", "ImageFX API call duration")
            .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 90.0]),
        &["operation"],
        REGISTRY
    ).unwrap();

    /// Generation failures by mapped failure code
    pub static ref GENERATION_FAILURES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("generation_failures_total", "Generation failures by failure code"),
        &["code"],
        REGISTRY
    ).unwrap();

    /// Images successfully decoded and returned to visitors
    pub static ref IMAGES_GENERATED: CounterVec = register_counter_vec_with_registry!(
        Opts::new("images_generated_total", "Images returned to visitors"),
        &["source"], // source: vendor
        REGISTRY
    ).unwrap();

    // ============================================================================
    // PROMPT HELPER METRICS
    // ============================================================================

    /// Prompt helper calls (improve, translate, magic)
    pub static ref PROMPT_HELPER_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("prompt_helper_calls_total", "Prompt helper invocations"),
        &["operation", "status"], // status: success, failure, fallback
        REGISTRY
    ).unwrap();

    // ============================================================================
    // SESSION METRICS
    // ============================================================================

    /// Currently tracked visitor sessions
    pub static ref SESSIONS_ACTIVE: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("sessions_active", "Currently tracked visitor sessions"),
        &["type"], // type: active
        REGISTRY
    ).unwrap();

    /// Session lifecycle events
    pub static ref SESSION_EVENTS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("session_events_total", "Session lifecycle events"),
        &["event"], // event: created, idle_reset, evicted, reset
        REGISTRY
    ).unwrap();

    // ============================================================================
    // TASK METRICS
    // ============================================================================

    /// Finished async generation tasks by terminal state
    pub static ref TASKS_FINISHED: CounterVec = register_counter_vec_with_registry!(
        Opts::new("tasks_finished_total", "Finished async generation tasks"),
        &["state"], // state: SUCCESS, FAILURE
        REGISTRY
    ).unwrap();

    /// Async generation tasks currently queued
    pub static ref TASKS_PENDING: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("tasks_pending", "Async generation tasks currently queued"),
        &["type"], // type: pending
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
