//! Request and response bodies.
//!
//! Wei amounts travel as decimal strings so JSON clients never lose
//! precision.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::blockchain::{ConfirmationStatus, ContractInfo, SubmittedTransaction, TransactorOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub chain_id: u64,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: Address,
    pub chain_id: u64,
    /// Nonce the transactor will use next.
    pub next_nonce: u64,
    /// Nonce the node reports for the pending block.
    pub pending_nonce: u64,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasPriceResponse {
    pub gas_price: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactorResponse {
    pub from: Address,
    pub nonce: u64,
    pub value: String,
    pub gas_limit: u64,
    pub gas_price: String,
    pub chain_id: u64,
}

impl From<TransactorOptions> for TransactorResponse {
    fn from(opts: TransactorOptions) -> Self {
        Self {
            from: opts.from,
            nonce: opts.nonce,
            value: opts.value.to_string(),
            gas_limit: opts.gas_limit,
            gas_price: opts.gas_price.to_string(),
            chain_id: opts.chain_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractResponse {
    pub address: Address,
    pub deployed: bool,
    pub code_size: usize,
    pub balance: String,
}

impl From<ContractInfo> for ContractResponse {
    fn from(info: ContractInfo) -> Self {
        Self {
            address: info.address,
            deployed: info.deployed,
            code_size: info.code_size,
            balance: info.balance.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallRequest {
    /// Hex-encoded calldata.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResponse {
    pub result: Bytes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactRequest {
    /// Hex-encoded calldata.
    #[serde(default)]
    pub data: Option<String>,
    /// Value in wei, decimal or 0x-prefixed hex. Defaults to the transactor value.
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactResponse {
    pub tx_hash: TxHash,
    pub to: Address,
    pub nonce: u64,
    pub value: String,
    pub gas_price: String,
}

impl From<SubmittedTransaction> for TransactResponse {
    fn from(tx: SubmittedTransaction) -> Self {
        Self {
            tx_hash: tx.tx_hash,
            to: tx.to,
            nonce: tx.nonce,
            value: tx.value.to_string(),
            gas_price: tx.gas_price.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TxStatusResponse {
    pub tx_hash: TxHash,
    #[serde(flatten)]
    pub status: ConfirmationStatus,
}

/// Parse optional hex calldata; absent means empty.
pub fn parse_calldata(raw: Option<&str>) -> Result<Bytes, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Bytes::new()),
        Some(hex) => hex
            .parse::<Bytes>()
            .map_err(|e| format!("invalid calldata '{}': {}", hex, e)),
    }
}

/// Parse an optional wei amount.
pub fn parse_wei(raw: Option<&str>) -> Result<Option<U256>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<U256>()
            .map(Some)
            .map_err(|e| format!("invalid value '{}': {}", s, e)),
    }
}
