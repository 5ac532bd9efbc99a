//! Basic Logging Example
//!
//! Logs every record kind through a `LogTransport`, so nothing leaves the
//! process. Shows stats harvesting and a stop followed by a restart.
//!
//! Run with: cargo run -p demos --bin basic_logging

use std::collections::BTreeMap;
use std::time::Duration;

use dispatcher::{Dispatcher, LogTransport, TelemetryClient};
use observability::{LogFormat, ObservabilityConfig};
use tracing::info;

#[derive(Debug)]
struct DemoError;

impl std::fmt::Display for DemoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("cache miss on startup")
    }
}

impl std::error::Error for DemoError {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_with_config(ObservabilityConfig {
        metrics_port: None,
        log_format: LogFormat::Compact,
        default_log_level: "info".into(),
    })
    .map_err(|e| e.to_string())?;

    info!("Starting Basic Logging Demo");

    let dispatcher = Dispatcher::builder(LogTransport::new("demo"))
        .token("demo-token")
        .poll_interval(Duration::from_millis(100))
        .build()?;
    let client = TelemetryClient::new(dispatcher);

    let details = BTreeMap::from([
        ("screen".to_string(), "settings".to_string()),
        ("build".to_string(), "42".to_string()),
    ]);

    client.log_error(&DemoError, Some("first launch"), Some("user-1"), Some(&details));
    client.log_performance(230, "load_settings", Some("user-1"), None);
    client.log_event("opened_settings", Some("user-1"), Some(&details));
    client.log_information("startup", "all systems nominal", None, None);

    client.dispatcher().wait_idle(Duration::from_secs(5)).await;
    info!(stats = %client.get_execution_stats(), "First batch shipped");

    // Stop, then log again: the next enqueue spawns a fresh worker.
    client.stop_processing();
    tokio::time::sleep(Duration::from_millis(200)).await;
    info!(state = %client.dispatcher().state(), "After stop");

    client.log_event("resumed", None, None);
    client.dispatcher().wait_idle(Duration::from_secs(5)).await;
    info!(
        state = %client.dispatcher().state(),
        stats = %client.get_execution_stats(),
        metrics = ?client.dispatcher().metrics(),
        "Second batch shipped"
    );

    client.dispatcher().shutdown().await;
    info!("Basic Logging Demo finished");
    Ok(())
}
