//! # Telemetry Dispatcher CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - Configuration validation
//! - One-shot record dispatch (real collector or dry run)

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_send, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // JUSTLOGIT_TOKEN usually lives in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_tracing(cli.log_format.into(), log_level(&cli))?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry dispatcher CLI starting"
    );

    let result = match &cli.command {
        Commands::Send(args) => run_send(args).await,
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}

/// Default filter when `RUST_LOG` is unset
fn log_level(cli: &Cli) -> &'static str {
    if cli.quiet {
        return "warn";
    }
    match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
