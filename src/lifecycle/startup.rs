//! Startup orchestration.
//!
//! Runs the bootstrap sequence in dependency order:
//!
//! ```text
//! dial RPC endpoint → load account key → pending nonce + gas price
//!     → transactor → contract handle → controller state
//! ```
//!
//! Any failure is returned to the caller, which treats it as fatal.

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::blockchain::{BlockchainError, ChainClient, ContractHandle, Transactor, Wallet};
use crate::config::TechnicaConfig;
use crate::controller::ControllerState;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to connect to RPC endpoint: {0}")]
    Connect(#[source] BlockchainError),

    #[error("Failed to load account key: {0}")]
    Wallet(#[source] BlockchainError),

    #[error("Failed to prepare transactor: {0}")]
    Transactor(#[source] BlockchainError),

    #[error("Invalid contract address: {0}")]
    Contract(#[source] BlockchainError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Everything the controller needs, fully initialized.
#[derive(Debug)]
pub struct Application {
    pub config: TechnicaConfig,
    pub client: ChainClient,
    pub transactor: Arc<Transactor>,
    pub contract: ContractHandle,
}

/// Bootstrap with the key from `PRIVATE_KEY`.
pub async fn bootstrap(config: TechnicaConfig) -> Result<Application, StartupError> {
    bootstrap_with(config, Wallet::from_env).await
}

/// Bootstrap with an explicit hex private key.
pub async fn bootstrap_with_private_key(
    config: TechnicaConfig,
    private_key: &str,
) -> Result<Application, StartupError> {
    bootstrap_with(config, |chain_id| Wallet::from_private_key(private_key, chain_id)).await
}

async fn bootstrap_with<F>(config: TechnicaConfig, load_wallet: F) -> Result<Application, StartupError>
where
    F: FnOnce(u64) -> Result<Wallet, BlockchainError>,
{
    let client = ChainClient::connect(config.blockchain.clone())
        .await
        .map_err(StartupError::Connect)?;

    let wallet = load_wallet(client.chain_id().0).map_err(StartupError::Wallet)?;

    let transactor = Transactor::bootstrap(client.clone(), wallet, config.transactor.clone())
        .await
        .map_err(StartupError::Transactor)?;

    let contract = ContractHandle::parse(client.clone(), &config.contract.address)
        .map_err(StartupError::Contract)?;
    tracing::info!(contract = %contract.address(), "Contract address");

    match contract.inspect().await {
        Ok(info) if !info.deployed => {
            tracing::warn!(contract = %info.address, "No code deployed at contract address")
        }
        Ok(info) => tracing::debug!(contract = %info.address, code_size = info.code_size, "Contract found"),
        Err(e) => tracing::warn!(error = %e, "Could not inspect contract"),
    }

    Ok(Application {
        config,
        client,
        transactor: Arc::new(transactor),
        contract,
    })
}

impl Application {
    pub fn controller_state(&self) -> ControllerState {
        ControllerState {
            transactor: self.transactor.clone(),
            contract: self.contract.clone(),
        }
    }

    pub fn http_server(&self) -> HttpServer {
        HttpServer::new(self.config.server.clone(), self.controller_state())
    }

    /// Bind the configured address and serve until `shutdown` fires.
    pub async fn serve(self, shutdown: &Shutdown) -> Result<(), StartupError> {
        let address = self.config.server.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Bind { address, source })?;

        self.http_server()
            .run(listener, shutdown.subscribe())
            .await
            .map_err(StartupError::Serve)
    }
}
