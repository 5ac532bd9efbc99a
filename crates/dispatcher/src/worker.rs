//! Dispatch worker - drains the queue and ships items one at a time

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{Endpoint, ErrorRecord, QueueItem, Transport};

use crate::history::ErrorHistory;
use crate::metrics::DispatcherMetrics;
use crate::queue::EventQueue;
use crate::stats::StatsCollector;

/// State shared by the controller and every worker generation
///
/// Outlives individual workers, so stats and errors survive a respawn.
#[derive(Debug)]
pub(crate) struct Shared {
    pub queue: EventQueue,
    pub stats: StatsCollector,
    pub history: ErrorHistory,
    pub metrics: DispatcherMetrics,
    /// Wakes an idle worker early (enqueue, stop)
    pub wake: Notify,
    /// Set while an item is dequeued but not yet settled
    pub in_flight: AtomicBool,
}

impl Shared {
    pub fn new(error_capacity: usize) -> Self {
        Self {
            queue: EventQueue::new(),
            stats: StatsCollector::new(),
            history: ErrorHistory::new(error_capacity),
            metrics: DispatcherMetrics::new(),
            wake: Notify::new(),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Queue empty and nothing being dispatched
    pub fn is_idle(&self) -> bool {
        // Queue first: the worker raises `in_flight` before it dequeues.
        self.queue.is_empty() && !self.in_flight.load(Ordering::SeqCst)
    }
}

/// Holds `Shared::in_flight` up until dropped, including on unwind
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Why and how a worker generation ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerExit {
    pub generation: u64,
    pub delivered: u64,
    pub failed: u64,
}

/// Everything one worker generation owns
pub(crate) struct WorkerContext<T> {
    pub shared: Arc<Shared>,
    pub transport: Arc<T>,
    pub endpoint: Endpoint,
    pub stop: Arc<AtomicBool>,
    pub poll_interval: Duration,
    pub generation: u64,
}

impl<T: Transport + Sync> WorkerContext<T> {
    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Dispatch until the queue is empty or a stop is requested
    ///
    /// The stop flag is checked before each dequeue, so a stopped worker
    /// leaves undelivered items in the queue.
    async fn drain(&self, exit: &mut WorkerExit) {
        while !self.stop_requested() {
            let _in_flight = InFlight::raise(&self.shared.in_flight);
            let Some(item) = self.shared.queue.try_dequeue() else {
                break;
            };
            observability::record_queue_depth(self.shared.queue.len());

            self.dispatch(item, exit).await;
        }
    }

    async fn dispatch(&self, item: QueueItem, exit: &mut WorkerExit) {
        let request = self.endpoint.request_for(&item);
        let started = Instant::now();

        match self.transport.send(&request).await {
            Ok(()) => {
                let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                self.shared.stats.record(latency_ms);
                self.shared.metrics.inc_delivered();
                observability::record_dispatch(item.kind.as_str(), true);
                observability::record_dispatch_latency_ms(latency_ms as f64);
                exit.delivered += 1;
                debug!(kind = %item.kind, latency_ms, "Dispatched");
            }
            Err(e) => {
                self.shared.metrics.inc_failed();
                observability::record_dispatch(item.kind.as_str(), false);
                exit.failed += 1;
                warn!(kind = %item.kind, error = %e, "Dispatch failed, item dropped");

                if self
                    .shared
                    .history
                    .record(ErrorRecord::capture(item.kind, &e))
                    .is_some()
                {
                    observability::record_error_evicted();
                }
            }
        }
    }
}

/// Worker main loop
///
/// Drain, then sleep for the poll interval (or until woken), until the stop
/// flag is raised.
#[instrument(
    name = "dispatch_worker_loop",
    skip(ctx),
    fields(generation = ctx.generation, transport = %ctx.transport.name())
)]
pub(crate) async fn run_worker<T: Transport + Sync>(ctx: WorkerContext<T>) -> WorkerExit {
    debug!("Dispatch worker started");

    let mut exit = WorkerExit {
        generation: ctx.generation,
        ..WorkerExit::default()
    };

    while !ctx.stop_requested() {
        ctx.drain(&mut exit).await;
        if ctx.stop_requested() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(ctx.poll_interval) => {}
            _ = ctx.shared.wake.notified() => {}
        }
    }

    debug!(
        delivered = exit.delivered,
        failed = exit.failed,
        "Dispatch worker stopped"
    );
    exit
}

/// Await a worker that has been told to stop (or already died)
pub(crate) async fn reap(handle: JoinHandle<WorkerExit>) {
    match handle.await {
        Ok(exit) => debug!(
            generation = exit.generation,
            delivered = exit.delivered,
            failed = exit.failed,
            "Previous worker joined"
        ),
        Err(e) if e.is_panic() => error!(error = %e, "Previous worker panicked"),
        Err(e) => warn!(error = %e, "Previous worker cancelled"),
    }
}
