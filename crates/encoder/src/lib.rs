//! # Encoder
//!
//! Pure functions turning log call arguments into wire-ready payloads.
//!
//! - Errors become a JSON object (POST body)
//! - Performance, event and info records become a URL query string
//!
//! Nothing here fails: missing values encode as empty strings.

mod json;
mod query;

pub use json::encode_error;
pub use query::{encode_event, encode_information, encode_performance};

use contracts::{LogRecord, QueueItem};

/// Encode any record into its queued form
pub fn encode(record: &LogRecord) -> QueueItem {
    let payload = match record {
        LogRecord::Error(report) => encode_error(report),
        LogRecord::Performance(perf) => encode_performance(perf),
        LogRecord::Event(event) => encode_event(event),
        LogRecord::Information(info) => encode_information(info),
    };
    QueueItem::new(record.kind(), payload)
}
