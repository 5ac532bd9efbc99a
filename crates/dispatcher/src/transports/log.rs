//! LogTransport - logs requests via tracing instead of sending them

use contracts::{ContractError, DispatchRequest, Transport};
use tracing::{info, instrument};

/// Transport that only logs; every send succeeds
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for LogTransport {
    fn default() -> Self {
        Self::new("log")
    }
}

impl Transport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_send",
        skip(self, request),
        fields(transport = %self.name, kind = %request.kind)
    )]
    async fn send(&self, request: &DispatchRequest) -> Result<(), ContractError> {
        info!(
            method = ?request.method,
            url = %request.url,
            body = request.body.as_deref().unwrap_or(""),
            "Dispatch (dry run)"
        );
        Ok(())
    }
}
