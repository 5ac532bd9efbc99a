//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Dispatcher was shut down; no more items are accepted
    #[error("dispatcher is shut down")]
    Closed,

    /// Builder was used outside a Tokio runtime without an explicit handle
    #[error("no tokio runtime available to host the dispatch worker")]
    NoRuntime,

    /// Worker start-up aborted because the token could not be resolved
    #[error("worker start aborted: {0}")]
    TokenUnavailable(#[source] contracts::ContractError),

    /// Transport construction failed
    #[error("failed to create transport '{name}': {message}")]
    TransportCreation { name: String, message: String },

    /// Error from a contract type
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),
}

impl DispatcherError {
    /// Create a transport creation error
    pub fn transport_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
