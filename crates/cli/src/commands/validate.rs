//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{ConfiguredToken, TelemetryConfig, TokenSource};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    base_url: String,
    token_source: String,
    request_timeout_ms: u64,
    poll_interval_ms: u64,
    error_history_capacity: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(summarize(&config)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

fn summarize(config: &TelemetryConfig) -> ConfigSummary {
    let token_source = match config.endpoint.token {
        Some(_) => "literal".to_string(),
        None => format!("${}", config.endpoint.token_env),
    };

    ConfigSummary {
        version: format!("{:?}", config.version),
        base_url: config.endpoint.base_url.clone(),
        token_source,
        request_timeout_ms: config.endpoint.request_timeout_ms,
        poll_interval_ms: config.dispatcher.poll_interval_ms,
        error_history_capacity: config.dispatcher.error_history_capacity,
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &TelemetryConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if ConfiguredToken::from_config(&config.endpoint).resolve().is_err() {
        warnings.push(format!(
            "No token configured and ${} is unset - records will stay queued",
            config.endpoint.token_env
        ));
    }

    if config.endpoint.base_url.starts_with("http://") {
        warnings.push("Collector URL is plain http - tokens travel unencrypted".to_string());
    }

    if config.dispatcher.poll_interval_ms > 60_000 {
        warnings.push(format!(
            "poll_interval_ms is {} - idle workers react slowly to stop requests",
            config.dispatcher.poll_interval_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Collector: {}", summary.base_url);
            println!("  Token: {}", summary.token_source);
            println!("  Request timeout: {} ms", summary.request_timeout_ms);
            println!("  Poll interval: {} ms", summary.poll_interval_ms);
            println!("  Error history: {}", summary.error_history_capacity);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
