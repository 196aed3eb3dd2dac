//! Handle to the contract the service operates on.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use serde::Serialize;

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// On-chain facts about the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractInfo {
    pub address: Address,
    pub deployed: bool,
    pub code_size: usize,
    pub balance: U256,
}

/// A contract address bound to a client.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    client: ChainClient,
    address: Address,
}

impl ContractHandle {
    pub fn new(client: ChainClient, address: Address) -> Self {
        Self { client, address }
    }

    /// Parse a hex address (with or without `0x`) and bind it.
    pub fn parse(client: ChainClient, raw: &str) -> BlockchainResult<Self> {
        let address = raw
            .trim()
            .parse::<Address>()
            .map_err(|_| BlockchainError::InvalidAddress(raw.to_string()))?;
        Ok(Self::new(client, address))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Query deployed code and balance.
    pub async fn inspect(&self) -> BlockchainResult<ContractInfo> {
        let code = self.client.code_at(self.address).await?;
        let balance = self.client.balance(self.address).await?;
        Ok(ContractInfo {
            address: self.address,
            deployed: !code.is_empty(),
            code_size: code.len(),
            balance,
        })
    }

    /// Execute a read-only call with `data` as calldata.
    pub async fn call(&self, from: Address, data: Bytes) -> BlockchainResult<Bytes> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(self.address)
            .with_input(data);
        self.client.call(tx).await
    }
}
