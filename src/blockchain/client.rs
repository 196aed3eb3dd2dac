//! Blockchain RPC client with timeout, failover and error handling.
//!
//! # Responsibilities
//! - Dial the primary JSON-RPC endpoint plus optional failovers
//! - Query chain state (chain id, blocks, balances, nonces, gas price, code)
//! - Execute calls and broadcast signed transactions
//! - Handle timeouts and network errors gracefully

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::{TransportError, TransportResult};
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainId};
use crate::observability::logging::redact_url;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

type SharedProvider = Arc<dyn Provider + Send + Sync>;

/// Node replies meaning the exact transaction is already in its pool.
const ALREADY_KNOWN: [&str; 3] = ["already known", "known transaction", "already imported"];

/// JSON-RPC client wrapper with failover support.
#[derive(Clone)]
pub struct ChainClient {
    /// Primary provider first, then failovers in configured order.
    providers: Vec<SharedProvider>,
    /// Full endpoint URL paired with its loggable form.
    redactions: Vec<(String, String)>,
    config: BlockchainConfig,
    retry: RetryPolicy,
    /// Chain ID the client is bound to (configured or reported by the node).
    chain_id: ChainId,
    timeout_duration: Duration,
}

impl ChainClient {
    /// Dial the configured endpoints and resolve the chain ID.
    ///
    /// An unusable primary URL is fatal; unusable failovers are skipped.
    /// If `chain_id` is configured it must match what the node reports;
    /// otherwise the node's value is adopted.
    pub async fn connect(config: BlockchainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let (providers, redactions) = Self::build_providers(&config, timeout_duration).await?;
        let mut client = Self {
            providers,
            redactions,
            retry: RetryPolicy::from_config(&config),
            timeout_duration,
            chain_id: ChainId(config.chain_id.unwrap_or_default()),
            config,
        };

        let reported = client.fetch_chain_id().await?;
        if let Some(expected) = client.config.chain_id {
            if expected != reported.0 {
                return Err(BlockchainError::ChainMismatch {
                    expected,
                    actual: reported.0,
                });
            }
        }
        client.chain_id = reported;

        tracing::info!(
            rpc_url = %redact_url(&client.config.rpc_url),
            failovers = client.providers.len() - 1,
            chain_id = client.chain_id.0,
            "Connected to JSON-RPC endpoint"
        );

        Ok(client)
    }

    async fn build_providers(
        config: &BlockchainConfig,
        dial_timeout: Duration,
    ) -> BlockchainResult<(Vec<SharedProvider>, Vec<(String, String)>)> {
        let primary = dial(&config.rpc_url, dial_timeout).await?;
        let mut providers = vec![primary];
        let mut redactions = redactions_for(&config.rpc_url);

        for url in &config.failover_urls {
            match dial(url, dial_timeout).await {
                Ok(provider) => {
                    providers.push(provider);
                    redactions.extend(redactions_for(url));
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring unusable failover RPC URL"),
            }
        }

        Ok((providers, redactions))
    }

    /// Strip endpoint URLs (and the keys in them) from transport errors.
    fn scrub(&self, message: String) -> String {
        self.redactions
            .iter()
            .fold(message, |msg, (url, label)| msg.replace(url.as_str(), label))
    }

    /// Run `op` against each provider in order, for up to the configured
    /// number of rounds, backing off between rounds.
    ///
    /// Only for idempotent requests; see [`Self::send_transaction`].
    async fn with_failover<T, F, Fut>(&self, operation: &'static str, op: F) -> BlockchainResult<T>
    where
        F: Fn(SharedProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let mut last_error = None;

        for round in 1..=self.retry.rounds() {
            for (i, provider) in self.providers.iter().enumerate() {
                let start = Instant::now();
                match timeout(self.timeout_duration, op(provider.clone())).await {
                    Ok(Ok(result)) => {
                        metrics::record_rpc_call(operation, "ok", start);
                        return Ok(result);
                    }
                    Ok(Err(e)) => {
                        metrics::record_rpc_call(operation, "error", start);
                        let message = self.scrub(e.to_string());
                        tracing::warn!(operation, provider_idx = i, round, error = %message, "RPC error, trying next provider");
                        last_error = Some(BlockchainError::Rpc(message));
                    }
                    Err(_) => {
                        metrics::record_rpc_call(operation, "timeout", start);
                        tracing::warn!(operation, provider_idx = i, round, "RPC timeout, trying next provider");
                        last_error = Some(BlockchainError::Timeout(self.config.rpc_timeout_secs));
                    }
                }
            }

            if let Some(delay) = self.retry.delay_after(round) {
                tracing::debug!(operation, round, delay = ?delay, "All providers failed, backing off");
                tokio::time::sleep(delay).await;
            }
        }

        Err(all_failed(operation, last_error))
    }

    async fn fetch_chain_id(&self) -> BlockchainResult<ChainId> {
        self.with_failover("chain_id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Chain ID this client is bound to.
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// Get the latest block number.
    pub async fn block_number(&self) -> BlockchainResult<u64> {
        self.with_failover("block_number", |p| async move { p.get_block_number().await })
            .await
    }

    /// Get the balance of an address, in wei.
    pub async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        self.with_failover("balance", |p| async move { p.get_balance(address).await })
            .await
    }

    /// Get the next nonce for `address`, counting transactions still in the
    /// node's mempool.
    pub async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.with_failover("pending_nonce", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    /// Get the node's suggested gas price, in wei.
    pub async fn gas_price(&self) -> BlockchainResult<u128> {
        self.with_failover("gas_price", |p| async move { p.get_gas_price().await })
            .await
    }

    /// Get the deployed bytecode at `address`.
    pub async fn code_at(&self, address: Address) -> BlockchainResult<Bytes> {
        self.with_failover("code_at", |p| async move { p.get_code_at(address).await })
            .await
    }

    /// Execute a read-only call against the latest block.
    pub async fn call(&self, tx: TransactionRequest) -> BlockchainResult<Bytes> {
        self.with_failover("call", |p| {
            let tx = tx.clone();
            async move { p.call(tx).await }
        })
        .await
    }

    /// Get a transaction receipt by hash.
    pub async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        self.with_failover("transaction_receipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
    }

    /// Broadcast a signed transaction and return its hash.
    ///
    /// Each provider gets the envelope at most once and there are no retry
    /// rounds. A node that already holds the transaction counts as success,
    /// as does a timed-out send the node turns out to have accepted.
    pub async fn send_transaction(&self, envelope: TxEnvelope) -> BlockchainResult<TxHash> {
        const OPERATION: &str = "send_raw_transaction";

        let tx_hash = *envelope.tx_hash();
        let encoded = envelope.encoded_2718();
        let mut last_error = None;

        for (i, provider) in self.providers.iter().enumerate() {
            let start = Instant::now();
            match timeout(self.timeout_duration, provider.send_raw_transaction(&encoded)).await {
                Ok(Ok(_)) => {
                    metrics::record_rpc_call(OPERATION, "ok", start);
                    return Ok(tx_hash);
                }
                Ok(Err(e)) => {
                    let message = self.scrub(e.to_string());
                    let lower = message.to_lowercase();
                    let known = ALREADY_KNOWN.iter().any(|m| lower.contains(m))
                        || (lower.contains("nonce too low") && self.knows_transaction(provider, tx_hash).await);
                    if known {
                        metrics::record_rpc_call(OPERATION, "known", start);
                        tracing::info!(tx_hash = %tx_hash, provider_idx = i, "Node already has the transaction");
                        return Ok(tx_hash);
                    }
                    metrics::record_rpc_call(OPERATION, "error", start);
                    tracing::warn!(provider_idx = i, error = %message, "Broadcast rejected, trying next provider");
                    last_error = Some(BlockchainError::Rpc(message));
                }
                Err(_) => {
                    metrics::record_rpc_call(OPERATION, "timeout", start);
                    if self.knows_transaction(provider, tx_hash).await {
                        tracing::info!(tx_hash = %tx_hash, provider_idx = i, "Broadcast timed out but the node has the transaction");
                        return Ok(tx_hash);
                    }
                    tracing::warn!(provider_idx = i, "Broadcast timed out, trying next provider");
                    last_error = Some(BlockchainError::Timeout(self.config.rpc_timeout_secs));
                }
            }
        }

        Err(all_failed(OPERATION, last_error))
    }

    /// Whether `provider` returns the transaction by hash. Failures count as
    /// unknown.
    async fn knows_transaction(&self, provider: &SharedProvider, tx_hash: TxHash) -> bool {
        let lookup = async {
            let found: Option<serde_json::Value> = provider
                .client()
                .request("eth_getTransactionByHash", (tx_hash,))
                .await?;
            Ok::<_, TransportError>(found)
        };
        matches!(timeout(self.timeout_duration, lookup).await, Ok(Ok(Some(_))))
    }

    /// Latest block number, recording node health either way.
    pub async fn health(&self) -> BlockchainResult<u64> {
        let result = self.block_number().await;
        metrics::record_chain_health(result.is_ok());
        result
    }

    /// Check if the node is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.health().await.is_ok()
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    /// Get the number of confirmation blocks required.
    pub fn confirmation_blocks(&self) -> u32 {
        self.config.confirmation_blocks
    }
}

/// Dial one endpoint: `ws`/`wss` over a websocket, anything else over HTTP.
async fn dial(raw: &str, dial_timeout: Duration) -> BlockchainResult<SharedProvider> {
    let url: url::Url = raw
        .parse()
        .map_err(|e| BlockchainError::Rpc(format!("Invalid RPC URL: {}", e)))?;
    let label = redact_url(raw);

    // Nonce and gas are managed by the transactor, so the recommended
    // fillers stay off.
    let builder = ProviderBuilder::new().disable_recommended_fillers();
    match url.scheme() {
        "ws" | "wss" => {
            let provider = timeout(dial_timeout, builder.connect(raw))
                .await
                .map_err(|_| BlockchainError::Rpc(format!("Timed out dialing {}", label)))?
                .map_err(|e| {
                    let reason = e.to_string().replace(raw, &label);
                    BlockchainError::Rpc(format!("Failed to dial {}: {}", label, reason))
                })?;
            Ok(Arc::new(provider) as SharedProvider)
        }
        "http" | "https" => Ok(Arc::new(builder.connect_http(url)) as SharedProvider),
        other => Err(BlockchainError::Rpc(format!(
            "Invalid RPC URL '{}': unsupported scheme '{}'",
            label, other
        ))),
    }
}

/// Both the configured spelling of `raw` and its normalized form, since
/// transport errors print the latter.
fn redactions_for(raw: &str) -> Vec<(String, String)> {
    let label = redact_url(raw);
    let mut pairs = vec![(raw.to_string(), label.clone())];
    if let Ok(url) = url::Url::parse(raw) {
        let normalized = url.to_string();
        if normalized != raw {
            pairs.insert(0, (normalized, label));
        }
    }
    pairs
}

fn all_failed(operation: &str, last_error: Option<BlockchainError>) -> BlockchainError {
    match last_error {
        Some(BlockchainError::Rpc(msg)) => {
            BlockchainError::Rpc(format!("All RPC providers failed ({}): {}", operation, msg))
        }
        Some(other) => other,
        None => BlockchainError::Rpc(format!("All RPC providers failed ({})", operation)),
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("rpc_url", &redact_url(&self.config.rpc_url))
            .field("providers", &self.providers.len())
            .field("chain_id", &self.chain_id.0)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
