//! Config validation
//!
//! Rules:
//! - base_url is an absolute http(s) URL with a host
//! - a literal token, when present, is not blank
//! - token_env is not blank
//! - request_timeout_ms, poll_interval_ms and error_history_capacity > 0

use contracts::{ContractError, DispatcherSettings, EndpointConfig, TelemetryConfig};

/// Returns the first violation found
pub fn validate(config: &TelemetryConfig) -> Result<(), ContractError> {
    validate_endpoint(&config.endpoint)?;
    validate_dispatcher(&config.dispatcher)?;
    Ok(())
}

fn validate_endpoint(endpoint: &EndpointConfig) -> Result<(), ContractError> {
    let host = endpoint
        .base_url
        .strip_prefix("https://")
        .or_else(|| endpoint.base_url.strip_prefix("http://"))
        .ok_or_else(|| {
            ContractError::config_validation(
                "endpoint.base_url",
                format!(
                    "must start with http:// or https://, got '{}'",
                    endpoint.base_url
                ),
            )
        })?;

    if host.trim_end_matches('/').is_empty() {
        return Err(ContractError::config_validation(
            "endpoint.base_url",
            "host cannot be empty",
        ));
    }

    if matches!(&endpoint.token, Some(token) if token.trim().is_empty()) {
        return Err(ContractError::config_validation(
            "endpoint.token",
            "token cannot be blank; omit it to read from token_env",
        ));
    }

    if endpoint.token_env.trim().is_empty() {
        return Err(ContractError::config_validation(
            "endpoint.token_env",
            "token_env cannot be empty",
        ));
    }

    if endpoint.request_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "endpoint.request_timeout_ms",
            "request_timeout_ms must be > 0",
        ));
    }

    Ok(())
}

fn validate_dispatcher(settings: &DispatcherSettings) -> Result<(), ContractError> {
    if settings.poll_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.poll_interval_ms",
            "poll_interval_ms must be > 0",
        ));
    }

    if settings.error_history_capacity == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.error_history_capacity",
            "error_history_capacity must be > 0",
        ));
    }

    Ok(())
}
