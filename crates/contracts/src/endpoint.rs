//! Endpoint - collector address resolution
//!
//! Wire contract: `https://<host>/v1/log/<token>/<kind>`.

use crate::{HttpMethod, LogKind, QueueItem};

/// Resolved collector endpoint for one worker generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Scheme and host, without trailing slash
    pub base_url: String,
    /// Logging token resolved from configuration
    pub token: String,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// URL for a kind, without query string
    pub fn url_for(&self, kind: LogKind) -> String {
        format!("{}/v1/log/{}/{}", self.base_url, self.token, kind.as_str())
    }

    /// Build the request that ships one queued item
    pub fn request_for(&self, item: &QueueItem) -> DispatchRequest {
        let url = self.url_for(item.kind);
        match item.kind.http_method() {
            HttpMethod::Post => DispatchRequest {
                kind: item.kind,
                method: HttpMethod::Post,
                url,
                body: Some(item.payload.clone()),
            },
            HttpMethod::Get => DispatchRequest {
                kind: item.kind,
                method: HttpMethod::Get,
                url: format!("{url}?{}", item.payload),
                body: None,
            },
        }
    }
}

/// A fully-formed request for a [`crate::Transport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub kind: LogKind,
    pub method: HttpMethod,
    pub url: String,
    /// JSON body (POST only)
    pub body: Option<String>,
}
