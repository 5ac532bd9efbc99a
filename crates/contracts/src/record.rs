//! Log records - producer input and queued work items

use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied key/value pairs attached to a record.
///
/// Ordered so the wire encoding is deterministic.
pub type Details = BTreeMap<String, String>;

/// Category of a log entry
///
/// Determines the URL segment and the HTTP method used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Error,
    Perf,
    Event,
    Info,
}

impl LogKind {
    /// Wire segment of this kind (`error`, `perf`, `event`, `info`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Perf => "perf",
            Self::Event => "event",
            Self::Info => "info",
        }
    }

    /// HTTP method used to ship this kind
    pub fn http_method(&self) -> HttpMethod {
        match self {
            Self::Error => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP method of a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// One unit of queued work
///
/// `payload` is fully encoded (JSON body for errors, query string otherwise)
/// and opaque to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub kind: LogKind,
    pub payload: String,
}

impl QueueItem {
    pub fn new(kind: LogKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }
}

/// Error report (`log_error` arguments)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    /// Error message
    pub message: String,
    /// Stack or cause chain, one frame per line
    pub stack: Option<String>,
    /// Free-form detail text
    pub detail: Option<String>,
    pub user_id: Option<String>,
    pub details: Details,
}

impl ErrorReport {
    /// Build a report from an error value
    ///
    /// The message is the error's `Display`; the stack is its `source()` chain.
    pub fn from_error(error: &(dyn StdError + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {cause}"));
            source = cause.source();
        }

        Self {
            message: error.to_string(),
            stack: (!causes.is_empty()).then(|| causes.join("\n")),
            ..Self::default()
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }
}

/// Performance sample (`log_performance` arguments)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformanceRecord {
    pub milliseconds: i64,
    pub method: String,
    pub user_id: Option<String>,
    pub details: Details,
}

/// Named event (`log_event` arguments)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventRecord {
    pub name: String,
    pub user_id: Option<String>,
    pub details: Details,
}

/// Informational message (`log_information` arguments)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InformationRecord {
    pub method: String,
    pub detail: String,
    pub user_id: Option<String>,
    pub details: Details,
}

/// Any record a producer can submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Error(ErrorReport),
    Performance(PerformanceRecord),
    Event(EventRecord),
    Information(InformationRecord),
}

impl LogRecord {
    pub fn kind(&self) -> LogKind {
        match self {
            Self::Error(_) => LogKind::Error,
            Self::Performance(_) => LogKind::Perf,
            Self::Event(_) => LogKind::Event,
            Self::Information(_) => LogKind::Info,
        }
    }
}

/// A captured dispatch failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Kind of the dropped item
    pub kind: LogKind,
    /// Rendered error, including its cause chain
    pub error: String,
    pub occurred_at: DateTime<Utc>,
}

impl ErrorRecord {
    /// Capture an error now
    pub fn capture(kind: LogKind, error: &(dyn StdError + 'static)) -> Self {
        let mut rendered = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            rendered.push_str(": ");
            rendered.push_str(&cause.to_string());
            source = cause.source();
        }

        Self {
            kind,
            error: rendered,
            occurred_at: Utc::now(),
        }
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} dispatch failed: {}",
            self.occurred_at.to_rfc3339(),
            self.kind,
            self.error
        )
    }
}
