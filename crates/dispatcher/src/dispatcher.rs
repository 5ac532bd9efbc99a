//! Dispatcher - queue owner and worker lifecycle controller

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{
    ConfiguredToken, DispatcherSettings, DispatcherState, Endpoint, EndpointConfig,
    ErrorRecord, ExecutionStats, QueueItem, StaticToken, TelemetryConfig, TokenSource,
    Transport,
};

use crate::error::DispatcherError;
use crate::metrics::MetricsSnapshot;
use crate::transports::HttpTransport;
use crate::worker::{reap, run_worker, Shared, WorkerContext, WorkerExit};

/// Result of a successful `ensure_started`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// First worker spawned
    Started,
    /// Previous worker was dead or stopping; a fresh generation was spawned
    Restarted,
    /// A live worker already exists
    AlreadyRunning,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<T> {
    transport: T,
    base_url: String,
    token_source: Arc<dyn TokenSource>,
    poll_interval: Duration,
    error_capacity: usize,
    runtime: Option<Handle>,
}

impl<T: Transport + Sync + 'static> DispatcherBuilder<T> {
    /// Create a new DispatcherBuilder with default settings
    pub fn new(transport: T) -> Self {
        let endpoint = EndpointConfig::default();
        let settings = DispatcherSettings::default();
        Self {
            transport,
            token_source: Arc::new(ConfiguredToken::from_config(&endpoint)),
            base_url: endpoint.base_url,
            poll_interval: settings.poll_interval(),
            error_capacity: settings.error_history_capacity,
            runtime: None,
        }
    }

    /// Collector scheme and host
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Where the logging token is looked up on each start attempt
    pub fn token_source(mut self, source: impl TokenSource + 'static) -> Self {
        self.token_source = Arc::new(source);
        self
    }

    /// Use a fixed token
    pub fn token(self, token: impl Into<String>) -> Self {
        self.token_source(StaticToken(token.into()))
    }

    /// Idle sleep between queue drains
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Number of failures kept in the error history
    pub fn error_capacity(mut self, capacity: usize) -> Self {
        self.error_capacity = capacity;
        self
    }

    /// Apply poll interval and history capacity from configuration
    pub fn settings(self, settings: &DispatcherSettings) -> Self {
        self.poll_interval(settings.poll_interval())
            .error_capacity(settings.error_history_capacity)
    }

    /// Runtime that hosts the worker (defaults to the current one)
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Build the dispatcher; no worker is spawned until the first enqueue
    pub fn build(self) -> Result<Dispatcher<T>, DispatcherError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| DispatcherError::NoRuntime)?,
        };

        Ok(Dispatcher {
            shared: Arc::new(Shared::new(self.error_capacity)),
            transport: Arc::new(self.transport),
            token_source: self.token_source,
            base_url: self.base_url,
            poll_interval: self.poll_interval,
            runtime,
            supervisor: Mutex::new(Supervisor::default()),
        })
    }
}

/// Currently owned worker generation
struct WorkerSlot {
    generation: u64,
    stop: Arc<AtomicBool>,
    join: JoinHandle<WorkerExit>,
}

impl WorkerSlot {
    fn is_live(&self) -> bool {
        !self.join.is_finished() && !self.stop.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct Supervisor {
    worker: Option<WorkerSlot>,
    generation: u64,
    shut_down: bool,
}

/// Owns the event queue and supervises a single dispatch worker
///
/// Producers call [`Dispatcher::enqueue`] from any thread; the first enqueue
/// spawns the worker, and later enqueues respawn it if it has died or was
/// stopped. Stats and error history live here, not in the worker.
pub struct Dispatcher<T> {
    shared: Arc<Shared>,
    transport: Arc<T>,
    token_source: Arc<dyn TokenSource>,
    base_url: String,
    poll_interval: Duration,
    runtime: Handle,
    supervisor: Mutex<Supervisor>,
}

impl<T: Transport + Sync + 'static> Dispatcher<T> {
    pub fn builder(transport: T) -> DispatcherBuilder<T> {
        DispatcherBuilder::new(transport)
    }

    /// Queue an item and make sure a worker is running
    ///
    /// Never blocks. When the worker cannot be started (token unavailable),
    /// the item stays queued and the start error is returned.
    pub fn enqueue(&self, item: QueueItem) -> Result<(), DispatcherError> {
        if self.lock_supervisor().shut_down {
            self.shared.metrics.inc_rejected();
            return Err(DispatcherError::Closed);
        }

        let kind = item.kind;
        self.shared.queue.enqueue(item);
        self.shared.metrics.inc_enqueued();
        observability::record_item_enqueued(kind.as_str());
        self.shared.wake.notify_one();

        self.ensure_started().map(|_| ())
    }

    /// Spawn a worker unless a live one exists
    ///
    /// The token is resolved on every call. A replacement worker first awaits
    /// its predecessor, so two workers never drain the queue at once.
    #[instrument(name = "dispatcher_ensure_started", skip(self), level = "debug")]
    pub fn ensure_started(&self) -> Result<StartOutcome, DispatcherError> {
        let token = self
            .token_source
            .resolve()
            .map_err(DispatcherError::TokenUnavailable)?;

        let mut supervisor = self.lock_supervisor();
        if supervisor.shut_down {
            return Err(DispatcherError::Closed);
        }
        if supervisor.worker.as_ref().is_some_and(WorkerSlot::is_live) {
            return Ok(StartOutcome::AlreadyRunning);
        }

        let previous = supervisor.worker.take();
        let outcome = if previous.is_some() {
            StartOutcome::Restarted
        } else {
            StartOutcome::Started
        };

        supervisor.generation += 1;
        let generation = supervisor.generation;
        let stop = Arc::new(AtomicBool::new(false));
        let ctx = WorkerContext {
            shared: Arc::clone(&self.shared),
            transport: Arc::clone(&self.transport),
            endpoint: Endpoint::new(&self.base_url, token),
            stop: Arc::clone(&stop),
            poll_interval: self.poll_interval,
            generation,
        };

        let join = self.runtime.spawn(async move {
            if let Some(previous) = previous {
                reap(previous.join).await;
            }
            run_worker(ctx).await
        });
        supervisor.worker = Some(WorkerSlot {
            generation,
            stop,
            join,
        });

        self.shared.metrics.inc_spawned();
        observability::record_worker_spawned(outcome == StartOutcome::Restarted);
        info!(generation, ?outcome, "Dispatch worker spawned");

        Ok(outcome)
    }

    /// Request a cooperative stop
    ///
    /// Returns immediately and clears pending latency samples. Items still
    /// queued stay queued; the next enqueue spawns a fresh worker.
    pub fn stop(&self) {
        let supervisor = self.lock_supervisor();
        if let Some(slot) = &supervisor.worker {
            slot.stop.store(true, Ordering::SeqCst);
            info!(generation = slot.generation, "Stop requested");
        }
        drop(supervisor);

        // Cleared only after the flag is raised.
        self.shared.stats.clear();
        self.shared.wake.notify_waiters();
    }

    /// Stop the worker for good and wait for it to exit
    ///
    /// Later enqueues fail with [`DispatcherError::Closed`].
    #[instrument(name = "dispatcher_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        let slot = {
            let mut supervisor = self.lock_supervisor();
            supervisor.shut_down = true;
            supervisor.worker.take()
        };

        if let Some(slot) = slot {
            slot.stop.store(true, Ordering::SeqCst);
            self.shared.wake.notify_waiters();
            reap(slot.join).await;
        }

        info!(
            undelivered = self.shared.queue.len(),
            "Dispatcher shutdown complete"
        );
    }

    /// Wait until the queue is empty and nothing is in flight
    ///
    /// Returns `false` if `timeout` elapses first.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let poll = async {
            while !self.shared.is_idle() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        let idle = tokio::time::timeout(timeout, poll).await.is_ok();
        debug!(idle, queued = self.queue_len(), "wait_idle finished");
        idle
    }
}

impl<T> Dispatcher<T> {
    /// Current lifecycle state
    pub fn state(&self) -> DispatcherState {
        let supervisor = self.lock_supervisor();
        if supervisor.shut_down {
            return DispatcherState::Shutdown;
        }
        match &supervisor.worker {
            None => DispatcherState::NotStarted,
            Some(slot) if slot.join.is_finished() => DispatcherState::Stopped,
            Some(slot) if slot.stop.load(Ordering::SeqCst) => DispatcherState::Stopping,
            Some(_) => DispatcherState::Running,
        }
    }

    /// Number of items waiting to be dispatched
    pub fn queue_len(&self) -> usize {
        self.shared.queue.len()
    }

    /// Harvest latency samples (destructive)
    pub fn execution_stats(&self) -> ExecutionStats {
        self.shared.stats.harvest()
    }

    /// Remove and return recorded dispatch failures, oldest first
    pub fn drain_errors(&self) -> Vec<ErrorRecord> {
        self.shared.history.drain()
    }

    /// Remove recorded failures and render them as one report
    pub fn errors_report(&self) -> String {
        self.shared.history.drain_report()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    fn lock_supervisor(&self) -> MutexGuard<'_, Supervisor> {
        self.supervisor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Convenience function to create an HTTP dispatcher from configuration
///
/// Must be called inside a Tokio runtime.
#[instrument(name = "dispatcher_create", skip(config), fields(base_url = %config.endpoint.base_url))]
pub fn create_dispatcher(
    config: &TelemetryConfig,
) -> Result<Dispatcher<HttpTransport>, DispatcherError> {
    let transport = HttpTransport::new(config.endpoint.request_timeout())?;

    DispatcherBuilder::new(transport)
        .base_url(&config.endpoint.base_url)
        .token_source(ConfiguredToken::from_config(&config.endpoint))
        .settings(&config.dispatcher)
        .build()
}

/// Dropping without `shutdown()` still stops the worker; it exits on its
/// next stop check and releases the transport.
impl<T> Drop for Dispatcher<T> {
    fn drop(&mut self) {
        let slot = self.lock_supervisor().worker.take();
        if let Some(slot) = slot {
            slot.stop.store(true, Ordering::SeqCst);
            self.shared.wake.notify_waiters();
            debug!(generation = slot.generation, "Dispatcher dropped, worker detached");
        }
    }
}

impl<T> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("base_url", &self.base_url)
            .field("state", &self.state())
            .field("queued", &self.queue_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ContractError, DispatchRequest, EnvToken, LogKind};
    use std::sync::atomic::AtomicU64;
    use std::thread;
    use tokio::time::sleep;

    /// Mock transport for testing
    struct MockTransport {
        send_count: Arc<AtomicU64>,
        should_fail: bool,
    }

    impl Transport for MockTransport {
        fn name(&self) -> &str {
            "mock"
        }

        async fn send(&self, _request: &DispatchRequest) -> Result<(), ContractError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                return Err(ContractError::HttpStatus {
                    kind: "event".into(),
                    status: 500,
                });
            }
            Ok(())
        }
    }

    /// Transport whose lifetime is observable through `_marker`
    struct MarkedTransport {
        _marker: Arc<()>,
    }

    impl Transport for MarkedTransport {
        fn name(&self) -> &str {
            "marked"
        }

        async fn send(&self, _request: &DispatchRequest) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn dispatcher(should_fail: bool) -> (Dispatcher<MockTransport>, Arc<AtomicU64>) {
        let send_count = Arc::new(AtomicU64::new(0));
        let transport = MockTransport {
            send_count: Arc::clone(&send_count),
            should_fail,
        };
        let dispatcher = Dispatcher::builder(transport)
            .base_url("http://collector")
            .token("tok")
            .poll_interval(Duration::from_millis(20))
            .build()
            .unwrap();
        (dispatcher, send_count)
    }

    fn item(n: usize) -> QueueItem {
        QueueItem::new(LogKind::Event, format!("n=e{n}"))
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let result = Dispatcher::builder(MockTransport {
            send_count: Arc::new(AtomicU64::new(0)),
            should_fail: false,
        })
        .build();
        assert!(matches!(result, Err(DispatcherError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_first_enqueue_starts_worker() {
        let (dispatcher, send_count) = dispatcher(false);
        assert_eq!(dispatcher.state(), DispatcherState::NotStarted);

        dispatcher.enqueue(item(1)).unwrap();
        assert_eq!(dispatcher.state(), DispatcherState::Running);
        assert_eq!(
            dispatcher.ensure_started().unwrap(),
            StartOutcome::AlreadyRunning
        );

        assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);
        assert_eq!(send_count.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.execution_stats().count, 1);
        assert_eq!(dispatcher.metrics().spawned, 1);

        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_token_keeps_items_queued() {
        let dispatcher = Dispatcher::builder(MockTransport {
            send_count: Arc::new(AtomicU64::new(0)),
            should_fail: false,
        })
        .token_source(EnvToken::new("DISPATCHER_TEST_TOKEN_THAT_IS_NEVER_SET"))
        .build()
        .unwrap();

        let result = dispatcher.enqueue(item(1));
        assert!(matches!(result, Err(DispatcherError::TokenUnavailable(_))));
        assert_eq!(dispatcher.queue_len(), 1);
        assert_eq!(dispatcher.state(), DispatcherState::NotStarted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_producers_count() {
        let dispatcher = Arc::new(
            Dispatcher::builder(MockTransport {
                send_count: Arc::new(AtomicU64::new(0)),
                should_fail: false,
            })
            .token_source(EnvToken::new("DISPATCHER_TEST_TOKEN_THAT_IS_NEVER_SET"))
            .build()
            .unwrap(),
        );

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let dispatcher = Arc::clone(&dispatcher);
                thread::spawn(move || {
                    for i in 0..100 {
                        let _ = dispatcher.enqueue(item(p * 100 + i));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        assert_eq!(dispatcher.queue_len(), 400);
        assert_eq!(dispatcher.metrics().enqueued, 400);
    }

    #[tokio::test]
    async fn test_enqueue_after_stop_starts_fresh_worker() {
        let (dispatcher, send_count) = dispatcher(false);
        dispatcher.enqueue(item(1)).unwrap();
        assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);

        dispatcher.stop();
        assert_ne!(dispatcher.state(), DispatcherState::Running);

        dispatcher.enqueue(item(2)).unwrap();
        assert_eq!(dispatcher.state(), DispatcherState::Running);
        assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);

        assert_eq!(send_count.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.metrics().spawned, 2);
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_stop_settles_to_stopped() {
        let (dispatcher, _) = dispatcher(false);
        dispatcher.enqueue(item(1)).unwrap();
        dispatcher.stop();

        for _ in 0..100 {
            if dispatcher.state() == DispatcherState::Stopped {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
        assert!(dispatcher.execution_stats().is_empty());
    }

    #[tokio::test]
    async fn test_stop_clears_delivered_samples() {
        let (dispatcher, send_count) = dispatcher(false);
        dispatcher.enqueue(item(1)).unwrap();
        dispatcher.enqueue(item(2)).unwrap();
        assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);
        assert_eq!(send_count.load(Ordering::SeqCst), 2);

        dispatcher.stop();

        assert!(dispatcher.execution_stats().is_empty());
        dispatcher.shutdown().await;
    }

    #[tokio::test]
    async fn test_drop_releases_worker_and_transport() {
        let marker = Arc::new(());
        let transport = MarkedTransport {
            _marker: Arc::clone(&marker),
        };
        let dispatcher = Dispatcher::builder(transport)
            .base_url("http://collector")
            .token("tok")
            .poll_interval(Duration::from_millis(20))
            .build()
            .unwrap();
        dispatcher.enqueue(item(1)).unwrap();
        assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);
        assert_eq!(Arc::strong_count(&marker), 2);

        drop(dispatcher);

        for _ in 0..200 {
            if Arc::strong_count(&marker) == 1 {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(Arc::strong_count(&marker), 1);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_enqueue() {
        let (dispatcher, _) = dispatcher(false);
        dispatcher.enqueue(item(1)).unwrap();
        dispatcher.shutdown().await;

        assert_eq!(dispatcher.state(), DispatcherState::Shutdown);
        assert!(matches!(
            dispatcher.enqueue(item(2)),
            Err(DispatcherError::Closed)
        ));
        assert_eq!(dispatcher.metrics().rejected, 1);
    }

    #[tokio::test]
    async fn test_failing_transport_fills_history() {
        let (dispatcher, send_count) = dispatcher(true);
        for n in 0..12 {
            dispatcher.enqueue(item(n)).unwrap();
        }
        assert!(dispatcher.wait_idle(Duration::from_secs(5)).await);

        assert_eq!(send_count.load(Ordering::SeqCst), 12);
        assert!(dispatcher.execution_stats().is_empty());
        assert_eq!(dispatcher.drain_errors().len(), 10);
        assert_eq!(dispatcher.metrics().failed, 12);
        dispatcher.shutdown().await;
    }
}
