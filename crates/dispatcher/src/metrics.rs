//! Dispatcher counters for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// In-process counters, cumulative since construction
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Items accepted into the queue
    enqueued: AtomicU64,
    /// Items rejected because the dispatcher is shut down
    rejected: AtomicU64,
    /// Successful dispatches
    delivered: AtomicU64,
    /// Failed dispatches (item dropped)
    failed: AtomicU64,
    /// Worker generations spawned, including the first
    spawned: AtomicU64,
}

impl DispatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn inc_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn inc_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    pub fn inc_spawned(&self) {
        self.spawned.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued(),
            rejected: self.rejected(),
            delivered: self.delivered(),
            failed: self.failed(),
            spawned: self.spawned(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub rejected: u64,
    pub delivered: u64,
    pub failed: u64,
    pub spawned: u64,
}
