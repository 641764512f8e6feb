// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    CACHE_ENTRIES,
    CACHE_OPERATIONS,
    DAILY_USAGE,
    GEMINI_API_CALLS,
    GEMINI_API_DURATION,
    GOVERNOR_DECISIONS,
};

/// Helper to record a governor decision (allowed or the denial reason)
pub fn record_governor_decision(outcome: &str) {
    GOVERNOR_DECISIONS.with_label_values(&[outcome]).inc();
}

pub fn update_daily_usage(used: u32) {
    DAILY_USAGE.set(f64::from(used));
}

/// Helper to record Gemini API call metrics
pub fn record_gemini_call(model: &str, success: bool, duration_secs: f64) {
    let status = if success { "ok" } else { "error" };
    GEMINI_API_CALLS.with_label_values(&[model, status]).inc();
    GEMINI_API_DURATION
        .with_label_values(&[model])
        .observe(duration_secs);
}

/// Helpers to record response cache operations
pub fn record_cache_hit() {
    CACHE_OPERATIONS.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_OPERATIONS.with_label_values(&["miss"]).inc();
}

pub fn record_cache_insert() {
    CACHE_OPERATIONS.with_label_values(&["insert"]).inc();
}

pub fn record_cache_eviction() {
    CACHE_OPERATIONS.with_label_values(&["eviction"]).inc();
}

pub fn update_cache_entries(count: usize) {
    CACHE_ENTRIES.with_label_values(&["responses"]).set(count as f64);
}
