//! `send` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use config_loader::ConfigLoader;
use contracts::{
    ConfiguredToken, DispatcherState, ErrorReport, EventRecord, ExecutionStats,
    InformationRecord, LogRecord, PerformanceRecord, TelemetryConfig, TokenSource, Transport,
};
use dispatcher::{create_dispatcher, Dispatcher, LogTransport};

use crate::cli::{RecordKind, SendArgs};

/// Outcome of a `send` run
#[derive(Debug, Serialize)]
struct SendReport {
    queued: usize,
    delivered: u64,
    failed: u64,
    undelivered: usize,
    drained: bool,
    state: DispatcherState,
    stats: ExecutionStats,
    #[serde(skip_serializing_if = "String::is_empty")]
    errors: String,
}

/// Execute the `send` command
pub async fn run_send(args: &SendArgs) -> Result<()> {
    let config = load_config(args)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let record = build_record(args);
    let report = if args.dry_run {
        // A dry run never talks to the collector, so any token will do.
        let token = ConfiguredToken::from_config(&config.endpoint)
            .resolve()
            .unwrap_or_else(|_| "dry-run".to_string());
        let dispatcher = Dispatcher::builder(LogTransport::new("dry-run"))
            .base_url(&config.endpoint.base_url)
            .token(token)
            .settings(&config.dispatcher)
            .build()?;
        deliver(dispatcher, &record, args).await?
    } else {
        let dispatcher =
            create_dispatcher(&config).context("Failed to create HTTP dispatcher")?;
        deliver(dispatcher, &record, args).await?
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize send report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    if report.failed > 0 || !report.drained {
        anyhow::bail!(
            "{} of {} records were not delivered",
            report.failed as usize + report.undelivered,
            report.queued
        );
    }
    Ok(())
}

fn load_config(args: &SendArgs) -> Result<TelemetryConfig> {
    let mut config = ConfigLoader::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(ref base_url) = args.base_url {
        info!(base_url = %base_url, "Overriding collector URL from CLI");
        config.endpoint.base_url = base_url.clone();
    }
    if let Some(ref token) = args.token {
        config.endpoint.token = Some(token.clone());
    }

    ConfigLoader::validate(&config).context("Invalid configuration after CLI overrides")?;
    Ok(config)
}

fn build_record(args: &SendArgs) -> LogRecord {
    let details = args.meta.iter().cloned().collect();
    let user_id = args.user.clone();

    match args.kind {
        RecordKind::Error => LogRecord::Error(ErrorReport {
            message: args.message.clone(),
            stack: args.stack.clone(),
            detail: args.detail.clone(),
            user_id,
            details,
        }),
        RecordKind::Perf => LogRecord::Performance(PerformanceRecord {
            milliseconds: args.ms,
            method: args.method.clone(),
            user_id,
            details,
        }),
        RecordKind::Event => LogRecord::Event(EventRecord {
            name: args.name.clone(),
            user_id,
            details,
        }),
        RecordKind::Info => LogRecord::Information(InformationRecord {
            method: args.method.clone(),
            detail: args.detail.clone().unwrap_or_default(),
            user_id,
            details,
        }),
    }
}

async fn deliver<T: Transport + Sync + 'static>(
    dispatcher: Dispatcher<T>,
    record: &LogRecord,
    args: &SendArgs,
) -> Result<SendReport> {
    let item = encoder::encode(record);
    info!(kind = %item.kind, count = args.count, "Queueing records");

    for _ in 0..args.count {
        dispatcher
            .enqueue(item.clone())
            .context("Failed to start dispatch worker")?;
    }

    let wait = Duration::from_secs(args.wait_secs);
    let drained = tokio::select! {
        idle = dispatcher.wait_idle(wait) => idle,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, abandoning queued records");
            false
        }
    };

    let stats = dispatcher.execution_stats();
    let errors = dispatcher.errors_report();
    dispatcher.shutdown().await;
    let metrics = dispatcher.metrics();

    Ok(SendReport {
        queued: args.count,
        delivered: metrics.delivered,
        failed: metrics.failed,
        undelivered: dispatcher.queue_len(),
        drained,
        state: dispatcher.state(),
        stats,
        errors,
    })
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn print_report(report: &SendReport) {
    println!("\n=== Dispatch Summary ===\n");
    println!("  Queued:      {}", report.queued);
    println!("  Delivered:   {}", report.delivered);
    println!("  Failed:      {}", report.failed);
    println!("  Undelivered: {}", report.undelivered);
    println!("  State:       {}", report.state);
    println!("  Latency:     {}", report.stats);

    if !report.errors.is_empty() {
        println!("\nErrors:\n");
        print!("{}", report.errors);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn send_args(argv: &[&str]) -> SendArgs {
        let mut full = vec!["telemetry-dispatcher", "send"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Send(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_build_error_record() {
        let args = send_args(&["error", "--message", "boom", "--user", "u1", "--meta", "k=v"]);
        let LogRecord::Error(report) = build_record(&args) else {
            panic!("expected error record");
        };
        assert_eq!(report.message, "boom");
        assert_eq!(report.user_id.as_deref(), Some("u1"));
        assert_eq!(report.details.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_build_info_record_defaults_detail() {
        let args = send_args(&["info", "--method", "boot"]);
        let LogRecord::Information(info) = build_record(&args) else {
            panic!("expected info record");
        };
        assert_eq!(info.method, "boot");
        assert_eq!(info.detail, "");
    }

    #[test]
    fn test_cli_overrides_apply() {
        let args = send_args(&[
            "event",
            "--base-url",
            "http://localhost:9999",
            "--token",
            "cli-token",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.endpoint.base_url, "http://localhost:9999");
        assert_eq!(config.endpoint.token.as_deref(), Some("cli-token"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = send_args(&["event", "--base-url", "localhost"]);
        assert!(load_config(&args).is_err());
    }

    #[tokio::test]
    async fn test_dry_run_delivers_everything() {
        let args = send_args(&["event", "--name", "signup", "--count", "3", "--dry-run"]);
        let dispatcher = Dispatcher::builder(LogTransport::default())
            .token("t")
            .poll_interval(Duration::from_millis(10))
            .build()
            .unwrap();

        let report = deliver(dispatcher, &build_record(&args), &args)
            .await
            .unwrap();

        assert!(report.drained);
        assert_eq!(report.delivered, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(report.stats.count, 3);
        assert_eq!(report.state, DispatcherState::Shutdown);
    }
}
