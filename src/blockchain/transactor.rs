//! Keyed transactor: nonce tracking, gas pricing, signing and broadcast.
//!
//! # Responsibilities
//! - Seed the nonce from the node's pending count and the gas price from
//!   the node's suggestion
//! - Hand out nonces strictly in order, one per submitted transaction
//! - Sign locally (EIP-155) and broadcast raw transactions
//! - Resynchronize the nonce when a broadcast fails
//! - Monitor confirmations

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use serde::Serialize;
use tokio::sync::MutexGuard;
use tokio::time::{interval, timeout};

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;
use crate::config::TransactorConfig;
use crate::observability::metrics;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Snapshot of the options applied to the next transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactorOptions {
    pub from: Address,
    pub nonce: u64,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: u128,
    pub chain_id: u64,
}

/// Result of a successful broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedTransaction {
    pub tx_hash: TxHash,
    pub to: Address,
    pub nonce: u64,
    pub value: U256,
    pub gas_price: u128,
}

/// Apply the configured multiplier to a suggested gas price and enforce the
/// upper bound.
pub fn adjust_gas_price(suggested: u128, multiplier: f64, max_gwei: u64) -> BlockchainResult<u128> {
    let adjusted = if multiplier == 1.0 {
        suggested
    } else {
        (suggested as f64 * multiplier) as u128
    };

    if adjusted > u128::from(max_gwei) * WEI_PER_GWEI {
        // Round up so a fractional overshoot never reads as equal to the cap.
        let current_gwei = adjusted.div_ceil(WEI_PER_GWEI);
        return Err(BlockchainError::GasPriceTooHigh {
            current_gwei: u64::try_from(current_gwei).unwrap_or(u64::MAX),
            max_gwei,
        });
    }

    Ok(adjusted)
}

/// Signs and submits transactions on behalf of the service account.
pub struct Transactor {
    client: ChainClient,
    wallet: Wallet,
    signer: EthereumWallet,
    config: TransactorConfig,
    value: U256,
    /// Next nonce to hand out.
    nonce: AtomicU64,
    /// Gas price in wei for the next transaction.
    gas_price: Mutex<u128>,
    /// Serializes submissions so nonces reach the node in order.
    submit_lock: tokio::sync::Mutex<()>,
}

impl Transactor {
    /// Build the transactor from the node's view of the account.
    pub async fn bootstrap(
        client: ChainClient,
        wallet: Wallet,
        config: TransactorConfig,
    ) -> BlockchainResult<Self> {
        let chain_id = client.chain_id().0;
        if wallet.chain_id() != chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: chain_id,
                actual: wallet.chain_id(),
            });
        }

        let from = wallet.address();
        let nonce = client.pending_nonce(from).await?;
        let suggested = client.gas_price().await?;
        let gas_price = adjust_gas_price(
            suggested,
            client.config().gas_price_multiplier,
            client.config().max_gas_price_gwei,
        )?;

        tracing::info!(
            from = %from,
            nonce,
            gas_price,
            value_wei = config.value_wei,
            gas_limit = config.gas_limit,
            "Transactor ready"
        );
        metrics::record_next_nonce(nonce);

        Ok(Self {
            signer: wallet.network_wallet(),
            value: U256::from(config.value_wei),
            nonce: AtomicU64::new(nonce),
            gas_price: Mutex::new(gas_price),
            submit_lock: tokio::sync::Mutex::new(()),
            client,
            wallet,
            config,
        })
    }

    /// Options that would apply to the next transaction.
    pub fn options(&self) -> TransactorOptions {
        TransactorOptions {
            from: self.wallet.address(),
            nonce: self.nonce.load(Ordering::SeqCst),
            value: self.value,
            gas_limit: self.config.gas_limit,
            gas_price: self.current_gas_price(),
            chain_id: self.wallet.chain_id(),
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Default value attached to transactions, in wei.
    pub fn default_value(&self) -> U256 {
        self.value
    }

    pub fn client(&self) -> &ChainClient {
        &self.client
    }

    fn current_gas_price(&self) -> u128 {
        *self.gas_price.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_gas_price(&self, price: u128) {
        *self.gas_price.lock().unwrap_or_else(|e| e.into_inner()) = price;
    }

    /// Build a legacy transaction request, consuming the next nonce.
    ///
    /// Takes the submit guard so a nonce is only handed out to the
    /// submission that will broadcast it.
    fn prepare(
        &self,
        _guard: &MutexGuard<'_, ()>,
        gas_price: u128,
        to: Address,
        value: U256,
        data: Bytes,
    ) -> (u64, TransactionRequest) {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let request = TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(to)
            .with_value(value)
            .with_input(data)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_gas_limit(self.config.gas_limit)
            .with_chain_id(self.wallet.chain_id());
        (nonce, request)
    }

    /// Re-query the suggested gas price.
    ///
    /// A failed query keeps the last known price; a price above the cap is
    /// an error.
    async fn refresh_gas_price(&self) -> BlockchainResult<u128> {
        match self.client.gas_price().await {
            Ok(suggested) => {
                let adjusted = adjust_gas_price(
                    suggested,
                    self.client.config().gas_price_multiplier,
                    self.client.config().max_gas_price_gwei,
                )?;
                self.set_gas_price(adjusted);
                Ok(adjusted)
            }
            Err(e) => {
                let last = self.current_gas_price();
                tracing::warn!(error = %e, gas_price = last, "Gas price refresh failed, using last known price");
                Ok(last)
            }
        }
    }

    /// Reset the local nonce to the node's pending count.
    pub async fn resync_nonce(&self) -> BlockchainResult<u64> {
        let nonce = self.client.pending_nonce(self.wallet.address()).await?;
        self.nonce.store(nonce, Ordering::SeqCst);
        metrics::record_next_nonce(nonce);
        tracing::info!(nonce, "Nonce resynchronized from node");
        Ok(nonce)
    }

    /// Sign and broadcast a transaction to `to`.
    ///
    /// `value` defaults to the configured transactor value.
    pub async fn submit(
        &self,
        to: Address,
        value: Option<U256>,
        data: Bytes,
    ) -> BlockchainResult<SubmittedTransaction> {
        let guard = self.submit_lock.lock().await;

        let gas_price = if self.config.refresh_gas_price {
            self.refresh_gas_price().await?
        } else {
            self.current_gas_price()
        };

        let value = value.unwrap_or(self.value);
        let (nonce, request) = self.prepare(&guard, gas_price, to, value, data);

        let envelope = match request.build(&self.signer).await {
            Ok(envelope) => envelope,
            Err(e) => {
                self.nonce.store(nonce, Ordering::SeqCst);
                metrics::record_transaction("signing_failed");
                return Err(BlockchainError::Signing(e.to_string()));
            }
        };

        match self.client.send_transaction(envelope).await {
            Ok(tx_hash) => {
                metrics::record_transaction("submitted");
                metrics::record_next_nonce(nonce + 1);
                tracing::info!(tx_hash = %tx_hash, to = %to, nonce, gas_price, "Transaction submitted");
                Ok(SubmittedTransaction {
                    tx_hash,
                    to,
                    nonce,
                    value,
                    gas_price,
                })
            }
            Err(e) => {
                metrics::record_transaction("broadcast_failed");
                tracing::error!(to = %to, nonce, error = %e, "Broadcast failed");
                if let Err(resync_err) = self.resync_nonce().await {
                    tracing::warn!(error = %resync_err, "Nonce resync failed, rolling back locally");
                    self.nonce.store(nonce, Ordering::SeqCst);
                }
                Err(e)
            }
        }
    }

    /// Single-shot confirmation status of a transaction.
    pub async fn confirmation_status(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        let receipt = match self.client.transaction_receipt(tx_hash).await? {
            Some(r) => r,
            None => return Ok(ConfirmationStatus::Pending),
        };

        if !receipt.status() {
            return Ok(ConfirmationStatus::Failed {
                reason: "Transaction reverted".to_string(),
            });
        }

        let required = self.client.confirmation_blocks();
        let current_block = self.client.block_number().await?;
        let tx_block = receipt.block_number.unwrap_or(current_block);
        let confirmations = u32::try_from(current_block.saturating_sub(tx_block) + 1).unwrap_or(u32::MAX);

        if confirmations >= required {
            Ok(ConfirmationStatus::Confirmed {
                block_number: tx_block,
            })
        } else {
            Ok(ConfirmationStatus::Confirming {
                current: confirmations,
                required,
            })
        }
    }

    /// Poll until the transaction is confirmed, reverted, or `timeout_secs`
    /// elapse.
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout_secs: u64,
        poll_interval: Duration,
    ) -> BlockchainResult<ConfirmationStatus> {
        let required = self.client.confirmation_blocks();

        let result = timeout(Duration::from_secs(timeout_secs), async {
            let mut ticker = interval(poll_interval);
            loop {
                ticker.tick().await;
                match self.confirmation_status(tx_hash).await? {
                    status @ (ConfirmationStatus::Confirmed { .. } | ConfirmationStatus::Failed { .. }) => {
                        return Ok(status);
                    }
                    status => tracing::debug!(tx_hash = %tx_hash, status = ?status, "Waiting for confirmations"),
                }
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BlockchainError::ConfirmationTimeout(required)),
        }
    }
}

impl std::fmt::Debug for Transactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transactor")
            .field("options", &self.options())
            .finish_non_exhaustive()
    }
}
