//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment (PRIVATE_KEY, INFURA_ENDPOINT, CONTRACT_ADDR)
//!     → client.rs (dial JSON-RPC, failover, timeouts)
//!     → wallet.rs (key loading, address derivation)
//!     → transactor.rs (pending nonce, gas price, sign, broadcast, confirm)
//!     → contract.rs (target contract: inspect, call)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod contract;
pub mod transactor;
pub mod types;
pub mod wallet;

pub use client::ChainClient;
pub use contract::{ContractHandle, ContractInfo};
pub use transactor::{SubmittedTransaction, Transactor, TransactorOptions};
pub use types::{BlockchainError, BlockchainResult, ChainId, ConfirmationStatus};
pub use wallet::Wallet;
