//! HttpTransport - ships requests to the remote collector over HTTP(S)

use std::time::Duration;

use contracts::{ContractError, DispatchRequest, HttpMethod, Transport};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::DispatcherError;

/// Transport backed by a shared `reqwest` client
///
/// Any transport error or non-2xx status is a failure.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    name: String,
    client: Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, DispatcherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("telemetry-dispatcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DispatcherError::transport_creation("http", e.to_string()))?;

        Ok(Self::with_client(client))
    }

    /// Wrap an existing client
    pub fn with_client(client: Client) -> Self {
        Self {
            name: "http".to_string(),
            client,
        }
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_transport_send",
        skip(self, request),
        fields(kind = %request.kind)
    )]
    async fn send(&self, request: &DispatchRequest) -> Result<(), ContractError> {
        let builder = match request.method {
            HttpMethod::Post => self
                .client
                .post(&request.url)
                .header(CONTENT_TYPE, "application/json")
                .body(request.body.clone().unwrap_or_default()),
            HttpMethod::Get => self.client.get(&request.url),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ContractError::transport(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::HttpStatus {
                kind: request.kind.to_string(),
                status: status.as_u16(),
            });
        }

        debug!(status = status.as_u16(), "Collector accepted request");
        Ok(())
    }
}
