//! Shared utilities for integration tests: an in-process JSON-RPC node.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes, TxHash};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use technica::config::TechnicaConfig;
use technica::http::HttpServer;
use technica::lifecycle::Shutdown;

/// Anvil's first account; publicly known, never holds real funds.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const CONTRACT_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const CHAIN_ID: u64 = 31337;
pub const GWEI: u128 = 1_000_000_000;

/// A transaction the node accepted, decoded.
#[derive(Debug, Clone)]
pub struct ReceivedTx {
    pub hash: TxHash,
    pub nonce: u64,
    pub to: Option<Address>,
    pub value: alloy::primitives::U256,
    pub gas_price: Option<u128>,
    pub gas_limit: u64,
    pub chain_id: Option<u64>,
    pub input: Bytes,
    /// Head block when the node accepted it; the receipt reports this block.
    pub block_number: u64,
    /// Receipt status.
    pub success: bool,
}

/// Mutable node state shared with the handler.
pub struct NodeState {
    pub chain_id: u64,
    pub block_number: AtomicU64,
    /// Pending transaction count for every address.
    pub nonce: AtomicU64,
    pub gas_price: Mutex<u128>,
    pub balance: Mutex<u128>,
    pub code: Mutex<Bytes>,
    pub call_result: Mutex<Bytes>,
    pub received: Mutex<Vec<ReceivedTx>>,
    /// Reject eth_sendRawTransaction with a JSON-RPC error.
    pub reject_sends: AtomicBool,
    /// Answer every request with a JSON-RPC error.
    pub offline: AtomicBool,
    /// Fail eth_gasPrice only.
    pub fail_gas_price: AtomicBool,
    /// Mark newly accepted transactions as reverted.
    pub revert: AtomicBool,
    /// Delay the reply to the next eth_sendRawTransaction (after accepting it).
    pub send_delay_ms: AtomicU64,
    /// Number of eth_sendRawTransaction requests seen.
    pub send_attempts: AtomicU64,
}

impl NodeState {
    pub fn received(&self) -> Vec<ReceivedTx> {
        self.received.lock().unwrap().clone()
    }
}

pub struct MockNode {
    pub url: String,
    pub addr: SocketAddr,
    pub state: Arc<NodeState>,
}

fn quantity(n: impl std::fmt::LowerHex) -> Value {
    Value::String(format!("0x{:x}", n))
}

/// Start a JSON-RPC node on an ephemeral port.
pub async fn start_mock_node(nonce: u64, gas_price: u128) -> MockNode {
    let state = Arc::new(NodeState {
        chain_id: CHAIN_ID,
        block_number: AtomicU64::new(100),
        nonce: AtomicU64::new(nonce),
        gas_price: Mutex::new(gas_price),
        balance: Mutex::new(5 * GWEI * GWEI),
        code: Mutex::new(Bytes::from(vec![0x60, 0x80, 0x60, 0x40])),
        call_result: Mutex::new(Bytes::from(vec![0u8; 31].into_iter().chain([42u8]).collect::<Vec<_>>())),
        received: Mutex::new(Vec::new()),
        reject_sends: AtomicBool::new(false),
        offline: AtomicBool::new(false),
        fail_gas_price: AtomicBool::new(false),
        revert: AtomicBool::new(false),
        send_delay_ms: AtomicU64::new(0),
        send_attempts: AtomicU64::new(0),
    });

    let app = Router::new()
        .route("/", post(rpc))
        .route("/ws", get(ws_upgrade))
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockNode {
        url: format!("http://{}", addr),
        addr,
        state,
    }
}

async fn rpc(State(state): State<Arc<NodeState>>, Json(body): Json<Value>) -> Json<Value> {
    let reply = respond(&state, &body);

    let sends = match &body {
        Value::Array(batch) => batch.iter().any(is_send),
        single => is_send(single),
    };
    if sends {
        let delay = state.send_delay_ms.swap(0, Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    Json(reply)
}

fn respond(state: &NodeState, body: &Value) -> Value {
    match body {
        Value::Array(batch) => Value::Array(batch.iter().map(|req| answer(state, req)).collect()),
        single => answer(state, single),
    }
}

fn is_send(req: &Value) -> bool {
    req.get("method").and_then(Value::as_str) == Some("eth_sendRawTransaction")
}

async fn ws_upgrade(State(state): State<Arc<NodeState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| ws_session(socket, state))
}

/// JSON-RPC over a websocket: one text frame per request.
async fn ws_session(mut socket: WebSocket, state: Arc<NodeState>) {
    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(body) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        let reply = respond(&state, &body).to_string();
        if socket.send(Message::Text(reply.into())).await.is_err() {
            break;
        }
    }
}

fn answer(state: &NodeState, req: &Value) -> Value {
    let id = req.get("id").cloned().unwrap_or(Value::Null);
    let method = req.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = req.get("params").cloned().unwrap_or(Value::Array(Vec::new()));

    let result = if state.offline.load(Ordering::SeqCst) {
        Err("node offline".to_string())
    } else {
        dispatch(state, method, &params)
    };

    match result {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(message) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32000, "message": message }
        }),
    }
}

fn dispatch(state: &NodeState, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "eth_chainId" => Ok(quantity(state.chain_id)),
        "eth_blockNumber" => Ok(quantity(state.block_number.load(Ordering::SeqCst))),
        "eth_getTransactionCount" => Ok(quantity(state.nonce.load(Ordering::SeqCst))),
        "eth_gasPrice" if state.fail_gas_price.load(Ordering::SeqCst) => {
            Err("gas oracle unavailable".to_string())
        }
        "eth_gasPrice" => Ok(quantity(*state.gas_price.lock().unwrap())),
        "eth_getBalance" => Ok(quantity(*state.balance.lock().unwrap())),
        "eth_getCode" => Ok(json!(state.code.lock().unwrap().clone())),
        "eth_call" => Ok(json!(state.call_result.lock().unwrap().clone())),
        "eth_sendRawTransaction" => send_raw(state, params),
        "eth_getTransactionReceipt" => Ok(receipt(state, params)),
        "eth_getTransactionByHash" => Ok(lookup(state, params)),
        other => Err(format!("method {} not supported", other)),
    }
}

fn send_raw(state: &NodeState, params: &Value) -> Result<Value, String> {
    state.send_attempts.fetch_add(1, Ordering::SeqCst);
    if state.reject_sends.load(Ordering::SeqCst) {
        return Err("nonce too low".to_string());
    }

    let raw: Bytes = params[0]
        .as_str()
        .ok_or("missing raw transaction")?
        .parse()
        .map_err(|e| format!("bad hex: {}", e))?;
    let envelope = TxEnvelope::decode_2718(&mut &raw[..]).map_err(|e| format!("bad tx: {}", e))?;
    let hash = keccak256(&raw);

    let mut received = state.received.lock().unwrap();
    if received.iter().any(|tx| tx.hash == hash) {
        return Err("already known".to_string());
    }
    received.push(ReceivedTx {
        hash,
        nonce: envelope.nonce(),
        to: envelope.to(),
        value: envelope.value(),
        gas_price: envelope.gas_price(),
        gas_limit: envelope.gas_limit(),
        chain_id: envelope.chain_id(),
        input: envelope.input().clone(),
        block_number: state.block_number.load(Ordering::SeqCst),
        success: !state.revert.load(Ordering::SeqCst),
    });
    state.nonce.fetch_add(1, Ordering::SeqCst);

    Ok(json!(hash))
}

fn receipt(state: &NodeState, params: &Value) -> Value {
    let Some(hash) = params[0].as_str().and_then(|s| s.parse::<TxHash>().ok()) else {
        return Value::Null;
    };
    let received = state.received.lock().unwrap();
    let Some(tx) = received.iter().find(|tx| tx.hash == hash) else {
        return Value::Null;
    };

    json!({
        "transactionHash": tx.hash,
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "ab".repeat(32)),
        "blockNumber": quantity(tx.block_number),
        "from": TEST_ADDRESS,
        "to": tx.to,
        "cumulativeGasUsed": "0x5208",
        "gasUsed": "0x5208",
        "effectiveGasPrice": quantity(tx.gas_price.unwrap_or_default()),
        "contractAddress": null,
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "type": "0x0",
        "status": if tx.success { "0x1" } else { "0x0" }
    })
}

fn lookup(state: &NodeState, params: &Value) -> Value {
    let Some(hash) = params[0].as_str().and_then(|s| s.parse::<TxHash>().ok()) else {
        return Value::Null;
    };
    let received = state.received.lock().unwrap();
    match received.iter().find(|tx| tx.hash == hash) {
        Some(tx) => json!({ "hash": tx.hash, "nonce": quantity(tx.nonce) }),
        None => Value::Null,
    }
}

impl MockNode {
    /// Websocket endpoint of the same node.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

/// Configuration pointing at `node`, with short timeouts for tests.
pub fn test_config(node: &MockNode) -> TechnicaConfig {
    let mut config = TechnicaConfig::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.blockchain.rpc_url = node.url.clone();
    config.blockchain.rpc_timeout_secs = 2;
    config.blockchain.rpc_retry_rounds = 1;
    config.contract.address = CONTRACT_ADDRESS.to_string();
    config
}

/// Serve `server` on an ephemeral port. Keep the returned [`Shutdown`]
/// alive for as long as the server should run.
pub async fn spawn_server(server: HttpServer) -> (String, Shutdown) {
    let shutdown = Shutdown::new();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (format!("http://{}", addr), shutdown)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
