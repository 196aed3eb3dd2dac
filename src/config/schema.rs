//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.
//! Secrets (the signing key) are deliberately absent: they are read from the
//! environment by the wallet and never pass through this structure.

use std::net::{AddrParseError, SocketAddr};

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TechnicaConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// JSON-RPC connection settings.
    pub blockchain: BlockchainConfig,

    /// Defaults applied to every outgoing transaction.
    pub transactor: TransactorConfig,

    /// Target contract.
    pub contract: ContractConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Total time allowed per request in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
            max_body_size: 256 * 1024,
        }
    }
}

/// Blockchain connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Expected chain ID. When unset the node's chain ID is used.
    pub chain_id: Option<u64>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Full passes over all providers before an RPC call gives up.
    pub rpc_retry_rounds: u32,

    /// Base delay between retry rounds in milliseconds.
    pub rpc_retry_base_delay_ms: u64,

    /// Upper bound for the delay between retry rounds in milliseconds.
    pub rpc_retry_max_delay_ms: u64,

    /// Number of block confirmations required for finality.
    pub confirmation_blocks: u32,

    /// Gas price multiplier (1.0 = node suggestion, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            failover_urls: Vec::new(),
            chain_id: None,
            rpc_timeout_secs: 10,
            rpc_retry_rounds: 2,
            rpc_retry_base_delay_ms: 200,
            rpc_retry_max_delay_ms: 2000,
            confirmation_blocks: 1,
            gas_price_multiplier: 1.0,
            max_gas_price_gwei: 500,
        }
    }
}

/// Per-transaction defaults used by the transactor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactorConfig {
    /// Value attached to each transaction, in wei.
    pub value_wei: u64,

    /// Gas limit, in units.
    pub gas_limit: u64,

    /// Query the node for a fresh gas price before every submission.
    pub refresh_gas_price: bool,
}

impl Default for TransactorConfig {
    fn default() -> Self {
        Self {
            value_wei: 300_000,
            gas_limit: 300_000,
            refresh_gas_price: true,
        }
    }
}

/// Contract the controller operates on.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractConfig {
    /// Hex-encoded contract address.
    pub address: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Scrape listener address, or `None` when metrics are disabled.
    pub fn metrics_socket_addr(&self) -> Result<Option<SocketAddr>, AddrParseError> {
        if !self.metrics_enabled {
            return Ok(None);
        }
        self.metrics_address.parse().map(Some)
    }
}
