//! technica: an HTTP front end to a single Ethereum contract.
//!
//! # Architecture Overview
//!
//! ```text
//!   .env / environment / TOML
//!            │
//!            ▼
//!        ┌────────┐     ┌────────────┐     ┌──────────────┐
//!        │ config │────▶│ ChainClient │────▶│  Transactor  │ (nonce, gas price,
//!        └────────┘     │  (JSON-RPC) │     │  + Wallet    │  value, gas limit)
//!                       └─────┬──────┘     └──────┬───────┘
//!                             │                   │
//!                             ▼                   ▼
//!                       ┌──────────────────────────────┐
//!   HTTP client ───────▶│  http server → controller    │
//!                       └──────────────────────────────┘
//! ```

pub mod blockchain;
pub mod config;
pub mod controller;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::TechnicaConfig;
pub use http::HttpServer;
pub use lifecycle::{Application, Shutdown};
