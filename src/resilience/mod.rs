//! Resilience helpers for outbound RPC traffic.
//!
//! # Data Flow
//! ```text
//! RPC call:
//!     → per-provider timeout (tokio::time::timeout)
//!     → on failure: next provider in the failover list
//!     → all providers failed: backoff.rs delay, then another round
//! ```

pub mod backoff;

pub use backoff::RetryPolicy;
