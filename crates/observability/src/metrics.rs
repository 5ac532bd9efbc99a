//! Dispatch metrics
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! every call is a no-op.

use metrics::{counter, gauge, histogram};

/// Record an item accepted into the queue
pub fn record_item_enqueued(kind: &str) {
    counter!(
        "telemetry_items_enqueued_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record the outcome of one dispatch
pub fn record_dispatch(kind: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "telemetry_dispatch_total",
        "kind" => kind.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record network latency of a successful dispatch
pub fn record_dispatch_latency_ms(latency_ms: f64) {
    histogram!("telemetry_dispatch_latency_ms").record(latency_ms);
}

/// Record the number of items still waiting
pub fn record_queue_depth(depth: usize) {
    gauge!("telemetry_queue_depth").set(depth as f64);
}

/// Record a worker spawn; `restart` is false for the first generation
pub fn record_worker_spawned(restart: bool) {
    counter!("telemetry_worker_spawns_total").increment(1);
    if restart {
        counter!("telemetry_worker_restarts_total").increment(1);
    }
}

/// Record a failure pushed out of the bounded error history
pub fn record_error_evicted() {
    counter!("telemetry_error_history_evictions_total").increment(1);
}
