//! ErrorHistory - bounded FIFO of recent dispatch failures

use std::fmt::Write;
use std::sync::{Mutex, MutexGuard};

use contracts::ErrorRecord;
use ringbuf::{traits::*, HeapRb};

/// Default number of failures retained
pub const DEFAULT_ERROR_CAPACITY: usize = 10;

/// Mutex-guarded ring of the most recent failures
///
/// Recording into a full ring evicts the oldest record first.
pub struct ErrorHistory {
    ring: Mutex<HeapRb<ErrorRecord>>,
    capacity: usize,
}

impl ErrorHistory {
    /// Create a history holding at most `capacity` records (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ring: Mutex::new(HeapRb::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record, evicting the oldest when full
    ///
    /// Returns the evicted record, if any.
    pub fn record(&self, record: ErrorRecord) -> Option<ErrorRecord> {
        let mut ring = self.lock();
        let evicted = if ring.is_full() { ring.try_pop() } else { None };
        let _ = ring.try_push(record);
        evicted
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every record, oldest first
    pub fn drain(&self) -> Vec<ErrorRecord> {
        self.lock().pop_iter().collect()
    }

    /// Remove every record and render them as one report
    ///
    /// Each record is followed by a blank line. Empty history yields `""`.
    pub fn drain_report(&self) -> String {
        self.drain().iter().fold(String::new(), |mut report, record| {
            let _ = write!(report, "{record}\n\n");
            report
        })
    }

    fn lock(&self) -> MutexGuard<'_, HeapRb<ErrorRecord>> {
        self.ring.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ErrorHistory {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_CAPACITY)
    }
}

impl std::fmt::Debug for ErrorHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHistory")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
