//! Configuration validation.
//!
//! Semantic checks run after all sources are merged. Every problem is
//! collected so a misconfigured deployment is reported in one pass.

use std::fmt;
use std::net::SocketAddr;

use alloy::primitives::Address;

use crate::config::schema::TechnicaConfig;
use crate::observability::logging::redact_url;

/// Smallest gas limit that can carry any transaction.
pub const MIN_GAS_LIMIT: u64 = 21_000;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a merged configuration.
pub fn validate_config(config: &TechnicaConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.blockchain.rpc_url.is_empty() {
        errors.push(ValidationError::new(
            "blockchain.rpc_url",
            "RPC endpoint is required (set INFURA_ENDPOINT)",
        ));
    } else if let Err(msg) = check_rpc_url(&config.blockchain.rpc_url) {
        errors.push(ValidationError::new("blockchain.rpc_url", msg));
    }

    for url in &config.blockchain.failover_urls {
        if let Err(msg) = check_rpc_url(url) {
            errors.push(ValidationError::new("blockchain.failover_urls", msg));
        }
    }

    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("blockchain.rpc_timeout_secs", "must be greater than 0"));
    }
    if config.blockchain.rpc_retry_rounds == 0 {
        errors.push(ValidationError::new("blockchain.rpc_retry_rounds", "must be at least 1"));
    }
    if !(config.blockchain.gas_price_multiplier > 0.0) {
        errors.push(ValidationError::new(
            "blockchain.gas_price_multiplier",
            "must be a positive number",
        ));
    }

    if config.contract.address.is_empty() {
        errors.push(ValidationError::new(
            "contract.address",
            "contract address is required (set CONTRACT_ADDR)",
        ));
    } else {
        match config.contract.address.parse::<Address>() {
            Ok(addr) if addr.is_zero() => {
                errors.push(ValidationError::new("contract.address", "zero address not allowed"));
            }
            Ok(_) => {}
            Err(e) => {
                errors.push(ValidationError::new(
                    "contract.address",
                    format!("invalid address '{}': {}", config.contract.address, e),
                ));
            }
        }
    }

    if config.transactor.gas_limit < MIN_GAS_LIMIT {
        errors.push(ValidationError::new(
            "transactor.gas_limit",
            format!("must be at least {}", MIN_GAS_LIMIT),
        ));
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("invalid socket address '{}'", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Endpoint URLs may embed an API key, so messages never echo them in full.
fn check_rpc_url(raw: &str) -> Result<(), String> {
    let url = url::Url::parse(raw).map_err(|e| format!("invalid URL: {}", e))?;
    match url.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(()),
        other => Err(format!("unsupported scheme '{}' in '{}'", other, redact_url(raw))),
    }
}
