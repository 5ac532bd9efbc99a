//! Layered error definitions
//!
//! Categorized by source: config / token / transport

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// No endpoint token could be resolved
    #[error("no logging token available from {source_name}")]
    MissingToken { source_name: String },

    // ===== Transport Errors =====
    /// Request could not be delivered
    #[error("transport '{transport}' error: {message}")]
    Transport { transport: String, message: String },

    /// Collector answered with a non-success status
    #[error("collector returned HTTP {status} for {kind} request")]
    HttpStatus { kind: String, status: u16 },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create missing token error
    pub fn missing_token(source_name: impl Into<String>) -> Self {
        Self::MissingToken {
            source_name: source_name.into(),
        }
    }

    /// Create transport error
    pub fn transport(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            transport: transport.into(),
            message: message.into(),
        }
    }
}
