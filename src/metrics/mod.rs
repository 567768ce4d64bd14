// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics, GENERATION_FAILURES, IMAGEFX_CALLS, IMAGEFX_DURATION, IMAGES_GENERATED,
    PROMPT_HELPER_CALLS, REQUESTS_TOTAL, REQUEST_DURATION, SESSIONS_ACTIVE, SESSION_EVENTS,
    TASKS_FINISHED, TASKS_PENDING,
};

use crate::tasks::TaskState;

/// Helper to record request metrics
pub fn record_request(method: &str, endpoint: &str, status_code: u16, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status_code.to_string()])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[method, endpoint, &status_code.to_string()])
        .observe(duration_secs);
}

/// Helper to record ImageFX API call metrics
pub fn record_imagefx_call(operation: &str, status_code: u16, duration_secs: f64) {
    IMAGEFX_CALLS
        .with_label_values(&[operation, &status_code.to_string()])
        .inc();

    IMAGEFX_DURATION
        .with_label_values(&[operation])
        .observe(duration_secs);
}

/// Helper to record a mapped generation failure
pub fn record_generation_failure(code: &str) {
    GENERATION_FAILURES.with_label_values(&[code]).inc();
}

/// Helper to record images handed back to a visitor
pub fn record_images_generated(count: usize) {
    IMAGES_GENERATED
        .with_label_values(&["vendor"])
        .inc_by(count as f64);
}

/// Helper to record prompt helper outcomes
pub fn record_prompt_helper(operation: &str, status: &str) {
    PROMPT_HELPER_CALLS
        .with_label_values(&[operation, status])
        .inc();
}

/// Helper to track the visitor-session gauge
pub fn update_active_sessions(count: usize) {
    SESSIONS_ACTIVE
        .with_label_values(&["active"])
        .set(count as f64);
}

/// Helper to record session lifecycle events
pub fn record_session_event(event: &str) {
    SESSION_EVENTS.with_label_values(&[event]).inc();
}

/// Helper to record a finished async task
pub fn record_task_finished(state: TaskState) {
    TASKS_FINISHED.with_label_values(&[state.as_str()]).inc();
}

/// Helper to track the pending-task gauge
pub fn update_pending_tasks(count: usize) {
    TASKS_PENDING
        .with_label_values(&["pending"])
        .set(count as f64);
}
