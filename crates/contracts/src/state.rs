//! DispatcherState - worker lifecycle as seen by callers

use serde::Serialize;
use std::fmt;

/// Lifecycle state of the dispatch worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatcherState {
    /// No worker was ever spawned
    NotStarted,
    /// A worker is alive and draining
    Running,
    /// Stop requested, worker has not exited yet
    Stopping,
    /// No live worker; the next enqueue spawns a fresh one
    Stopped,
    /// Terminal; enqueues are rejected
    Shutdown,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not_started",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}
