//! EventQueue - unbounded multi-producer queue of encoded items

use contracts::QueueItem;
use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Thread-safe FIFO between producers and the dispatch worker
///
/// No bound is enforced. Exactly one worker dequeues at a time; the lifecycle
/// controller guarantees that, not the queue.
#[derive(Debug)]
pub struct EventQueue {
    tx: Sender<QueueItem>,
    rx: Receiver<QueueItem>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// Append an item (never blocks)
    pub fn enqueue(&self, item: QueueItem) {
        // Both ends live in `self`, so the channel cannot be disconnected.
        let _ = self.tx.send(item);
    }

    /// Take the oldest item, if any
    pub fn try_dequeue(&self) -> Option<QueueItem> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
