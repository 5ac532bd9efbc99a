//! HTTP Logging Example
//!
//! Loads a configuration file and ships a handful of records to the
//! configured collector. The token comes from the file or `$JUSTLOGIT_TOKEN`.
//!
//! Run with: cargo run -p demos --bin http_logging [config_path]

use std::path::PathBuf;
use std::time::Duration;

use config_loader::ConfigLoader;
use dispatcher::{create_dispatcher, TelemetryClient};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ConfigLoader::load_or_default(config_path.as_deref())?;
    info!(collector = %config.endpoint.base_url, "Configuration loaded");

    let client = TelemetryClient::new(create_dispatcher(&config)?);

    for step in ["fetch", "parse", "render"] {
        let started = std::time::Instant::now();
        tokio::time::sleep(Duration::from_millis(25)).await;
        let elapsed = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
        client.log_performance(elapsed, step, None, None);
    }
    client.log_event("demo_completed", None, None);

    if client.get_queue_count() > 0 && client.dispatcher().metrics().spawned == 0 {
        warn!(
            token_env = %config.endpoint.token_env,
            "No token available; records stay queued"
        );
    }

    let drained = client
        .dispatcher()
        .wait_idle(Duration::from_secs(10))
        .await;
    info!(
        drained,
        stats = %client.get_execution_stats(),
        "Dispatch finished"
    );

    let errors = client.get_queue_errors();
    if !errors.is_empty() {
        warn!("Dispatch errors:\n{errors}");
    }

    client.dispatcher().shutdown().await;
    Ok(())
}
