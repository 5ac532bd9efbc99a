//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Telemetry Dispatcher - ship client telemetry to a log collector
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-dispatcher",
    author,
    version,
    about = "Client-side telemetry dispatcher",
    long_about = "Queues error, performance, event and information records and ships them \n\
                  to the collector from a single background worker."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TELEMETRY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Queue one or more records and wait for them to be shipped
    Send(SendArgs),

    /// Validate configuration file
    Validate(ValidateArgs),
}

/// Arguments for the `send` command
#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    /// Record kind
    #[arg(value_enum)]
    pub kind: RecordKind,

    /// Path to configuration file (TOML or JSON); defaults apply when absent
    #[arg(short, long, env = "TELEMETRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override collector base URL
    #[arg(long, env = "TELEMETRY_BASE_URL")]
    pub base_url: Option<String>,

    /// Override logging token
    #[arg(long)]
    pub token: Option<String>,

    /// Error message (error records)
    #[arg(long, default_value = "")]
    pub message: String,

    /// Stack text (error records)
    #[arg(long)]
    pub stack: Option<String>,

    /// Event name (event records)
    #[arg(long, default_value = "")]
    pub name: String,

    /// Method name (perf and info records)
    #[arg(long, default_value = "")]
    pub method: String,

    /// Detail text (error and info records)
    #[arg(long)]
    pub detail: Option<String>,

    /// Elapsed milliseconds (perf records)
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub ms: i64,

    /// User identifier
    #[arg(long)]
    pub user: Option<String>,

    /// Extra key=value detail (repeatable)
    #[arg(long = "meta", value_parser = parse_key_val)]
    pub meta: Vec<(String, String)>,

    /// Number of copies to queue
    #[arg(long, default_value = "1")]
    pub count: usize,

    /// Log requests instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds to wait for the queue to drain
    #[arg(long, default_value = "10")]
    pub wait_secs: u64,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "TELEMETRY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "telemetry.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Record kind accepted by `send`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Error,
    Perf,
    Event,
    Info,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("screen=home").unwrap(),
            ("screen".to_string(), "home".to_string())
        );
        assert_eq!(
            parse_key_val("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_send_args() {
        let cli = Cli::try_parse_from([
            "telemetry-dispatcher",
            "send",
            "perf",
            "--method",
            "load",
            "--ms",
            "42",
            "--meta",
            "a=1",
            "--meta",
            "b=2",
            "--dry-run",
        ])
        .unwrap();

        let Commands::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.kind, RecordKind::Perf);
        assert_eq!(args.ms, 42);
        assert_eq!(args.meta.len(), 2);
        assert!(args.dry_run);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result =
            Cli::try_parse_from(["telemetry-dispatcher", "-q", "-v", "validate"]);
        assert!(result.is_err());
    }
}
