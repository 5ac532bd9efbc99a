//! TelemetryConfig - Config Loader output
//!
//! Describes the collector endpoint and the dispatcher tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dispatcher configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Collector endpoint
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Worker and buffer settings
    #[serde(default)]
    pub dispatcher: DispatcherSettings,
}

/// Collector endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Scheme and host of the collector
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Literal logging token; takes precedence over `token_env`
    #[serde(default)]
    pub token: Option<String>,

    /// Environment variable consulted when `token` is absent
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout (milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            token_env: default_token_env(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl EndpointConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_base_url() -> String {
    "https://addto.justlog.it".to_string()
}

fn default_token_env() -> String {
    "JUSTLOGIT_TOKEN".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Worker and buffer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherSettings {
    /// Idle sleep between queue drains (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Number of dispatch failures kept for diagnostics
    #[serde(default = "default_error_history_capacity")]
    pub error_history_capacity: usize,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            error_history_capacity: default_error_history_capacity(),
        }
    }
}

impl DispatcherSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_error_history_capacity() -> usize {
    10
}
