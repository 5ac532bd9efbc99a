//! ExecutionStats - harvested latency summary

use serde::Serialize;
use std::fmt;

/// Min/max/average over one harvest of latency samples (milliseconds)
///
/// `count == 0` marks an empty harvest; the other fields are then zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionStats {
    pub count: usize,
    pub min: u64,
    pub max: u64,
    /// Truncating integer average
    pub avg: u64,
}

impl ExecutionStats {
    /// Summarize a batch of samples
    pub fn from_samples(samples: &[u64]) -> Self {
        let (Some(&min), Some(&max)) = (samples.iter().min(), samples.iter().max()) else {
            return Self::default();
        };
        // Widened so that samples clamped to u64::MAX cannot overflow
        let total: u128 = samples.iter().map(|&s| u128::from(s)).sum();
        let avg = total / samples.len() as u128;

        Self {
            count: samples.len(),
            min,
            max,
            avg: u64::try_from(avg).unwrap_or(max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl fmt::Display for ExecutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={}ms, max={}ms, avg={}ms (n={})",
                self.min, self.max, self.avg, self.count
            )
        }
    }
}
