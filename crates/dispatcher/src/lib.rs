//! # Dispatcher
//!
//! Asynchronous dispatch pipeline for client-side telemetry.
//!
//! Responsibilities:
//! - Queue encoded records from any number of producer threads
//! - Run a single background worker that ships them one at a time
//! - Restart a dead or stopped worker on the next enqueue
//! - Keep latency samples and a bounded history of failures

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod metrics;
pub mod queue;
pub mod stats;
pub mod transports;
mod worker;

pub use client::TelemetryClient;
pub use contracts::{DispatcherState, ErrorRecord, ExecutionStats, QueueItem, Transport};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, StartOutcome};
pub use error::DispatcherError;
pub use history::{ErrorHistory, DEFAULT_ERROR_CAPACITY};
pub use metrics::{DispatcherMetrics, MetricsSnapshot};
pub use queue::EventQueue;
pub use stats::StatsCollector;
pub use transports::{HttpTransport, LogTransport};
pub use worker::WorkerExit;
