//! StatsCollector - latency samples with destructive harvest

use std::sync::Mutex;

use contracts::ExecutionStats;

/// Accumulates per-dispatch latency samples (milliseconds)
#[derive(Debug, Default)]
pub struct StatsCollector {
    samples: Mutex<Vec<u64>>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample
    pub fn record(&self, latency_ms: u64) {
        self.lock().push(latency_ms);
    }

    /// Swap out every sample and summarize them
    ///
    /// The swap happens under the lock, so no concurrent `record` is lost or
    /// counted twice. An empty harvest returns the zero-count sentinel.
    pub fn harvest(&self) -> ExecutionStats {
        let samples = std::mem::take(&mut *self.lock());
        ExecutionStats::from_samples(&samples)
    }

    /// Drop pending samples without summarizing
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of pending samples
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<u64>> {
        self.samples
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
