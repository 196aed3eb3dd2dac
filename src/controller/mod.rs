//! HTTP routes over the contract, the RPC client and the transactor.
//!
//! | Route                      | Handler             |
//! |----------------------------|---------------------|
//! | `GET  /health`             | node reachability   |
//! | `GET  /account`            | service account     |
//! | `GET  /gas-price`          | suggested gas price |
//! | `GET  /transactor`         | next-tx options     |
//! | `GET  /contract`           | contract facts      |
//! | `POST /contract/call`      | eth_call            |
//! | `POST /contract/transact`  | sign + broadcast    |
//! | `GET  /tx/{hash}`          | confirmation status |

pub mod error;
pub mod extract;
pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::blockchain::{ContractHandle, Transactor};

pub use error::ApiError;
pub use extract::ApiJson;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct ControllerState {
    pub transactor: Arc<Transactor>,
    pub contract: ContractHandle,
}

/// Register all routes.
pub fn router(state: ControllerState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/account", get(handlers::get_account))
        .route("/gas-price", get(handlers::get_gas_price))
        .route("/transactor", get(handlers::get_transactor))
        .route("/contract", get(handlers::get_contract))
        .route("/contract/call", post(handlers::call_contract))
        .route("/contract/transact", post(handlers::transact_contract))
        .route("/tx/{hash}", get(handlers::get_transaction))
        .with_state(state)
}
