//! TokenSource - endpoint token resolution
//!
//! The token is looked up again on every worker start attempt.

use crate::{ContractError, EndpointConfig};

/// Resolves the logging token
pub trait TokenSource: Send + Sync {
    /// Return a non-empty token
    ///
    /// # Errors
    /// `ContractError::MissingToken` when nothing usable is configured
    fn resolve(&self) -> Result<String, ContractError>;
}

/// Fixed token
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
    fn resolve(&self) -> Result<String, ContractError> {
        non_empty(Some(self.0.clone()), "static token")
    }
}

/// Token read from an environment variable at resolve time
#[derive(Debug, Clone)]
pub struct EnvToken {
    pub var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenSource for EnvToken {
    fn resolve(&self) -> Result<String, ContractError> {
        non_empty(std::env::var(&self.var).ok(), &format!("${}", self.var))
    }
}

/// Configured literal first, environment variable second
#[derive(Debug, Clone)]
pub struct ConfiguredToken {
    literal: Option<String>,
    env: EnvToken,
}

impl ConfiguredToken {
    pub fn from_config(config: &EndpointConfig) -> Self {
        Self {
            literal: config.token.clone().filter(|t| !t.is_empty()),
            env: EnvToken::new(&config.token_env),
        }
    }
}

impl TokenSource for ConfiguredToken {
    fn resolve(&self) -> Result<String, ContractError> {
        match &self.literal {
            Some(token) => Ok(token.clone()),
            None => self.env.resolve(),
        }
    }
}

fn non_empty(token: Option<String>, source_name: &str) -> Result<String, ContractError> {
    token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ContractError::missing_token(source_name))
}
