//! TelemetryClient - the non-throwing logging entry points

use std::error::Error as StdError;
use std::sync::Arc;

use contracts::{
    Details, ErrorReport, EventRecord, ExecutionStats, InformationRecord, LogRecord,
    PerformanceRecord, Transport,
};
use tracing::debug;

use crate::dispatcher::Dispatcher;

/// Cloneable handle that producers log through
///
/// Every `log_*` call encodes its arguments, enqueues the result and returns.
/// Failures (no token, shut down) are reported through `tracing` only.
pub struct TelemetryClient<T> {
    dispatcher: Arc<Dispatcher<T>>,
}

impl<T> Clone for TelemetryClient<T> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<T: Transport + Sync + 'static> TelemetryClient<T> {
    pub fn new(dispatcher: Dispatcher<T>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Underlying dispatcher, for lifecycle control and typed results
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// Encode and enqueue any record
    pub fn log(&self, record: LogRecord) {
        let item = encoder::encode(&record);
        if let Err(e) = self.dispatcher.enqueue(item) {
            debug!(kind = %record.kind(), error = %e, "Log record not dispatched");
        }
    }

    pub fn log_error(
        &self,
        error: &(dyn StdError + 'static),
        detail: Option<&str>,
        user_id: Option<&str>,
        details: Option<&Details>,
    ) {
        let report = ErrorReport {
            detail: detail.map(str::to_string),
            user_id: user_id.map(str::to_string),
            details: details.cloned().unwrap_or_default(),
            ..ErrorReport::from_error(error)
        };
        self.log(LogRecord::Error(report));
    }

    pub fn log_performance(
        &self,
        milliseconds: i64,
        method: &str,
        user_id: Option<&str>,
        details: Option<&Details>,
    ) {
        self.log(LogRecord::Performance(PerformanceRecord {
            milliseconds,
            method: method.to_string(),
            user_id: user_id.map(str::to_string),
            details: details.cloned().unwrap_or_default(),
        }));
    }

    pub fn log_event(&self, name: &str, user_id: Option<&str>, details: Option<&Details>) {
        self.log(LogRecord::Event(EventRecord {
            name: name.to_string(),
            user_id: user_id.map(str::to_string),
            details: details.cloned().unwrap_or_default(),
        }));
    }

    pub fn log_information(
        &self,
        method: &str,
        detail: &str,
        user_id: Option<&str>,
        details: Option<&Details>,
    ) {
        self.log(LogRecord::Information(InformationRecord {
            method: method.to_string(),
            detail: detail.to_string(),
            user_id: user_id.map(str::to_string),
            details: details.cloned().unwrap_or_default(),
        }));
    }

    /// Cooperative, non-blocking stop (see [`Dispatcher::stop`])
    pub fn stop_processing(&self) {
        self.dispatcher.stop();
    }

    /// Harvest latency stats; destructive
    pub fn get_execution_stats(&self) -> ExecutionStats {
        self.dispatcher.execution_stats()
    }

    pub fn get_queue_count(&self) -> usize {
        self.dispatcher.queue_len()
    }

    /// Drain the error history as a report
    pub fn get_queue_errors(&self) -> String {
        self.dispatcher.errors_report()
    }
}

impl<T: Transport + Sync + 'static> From<Dispatcher<T>> for TelemetryClient<T> {
    fn from(dispatcher: Dispatcher<T>) -> Self {
        Self::new(dispatcher)
    }
}
