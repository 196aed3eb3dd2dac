//! Retry rounds for RPC calls.
//!
//! A round tries every provider once. Between rounds the caller sleeps for
//! an exponentially growing, capped delay with up to 10% jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::BlockchainConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    rounds: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(rounds: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            rounds: rounds.max(1),
            base_delay_ms,
            max_delay_ms,
        }
    }

    pub fn from_config(config: &BlockchainConfig) -> Self {
        Self::new(
            config.rpc_retry_rounds,
            config.rpc_retry_base_delay_ms,
            config.rpc_retry_max_delay_ms,
        )
    }

    /// Total number of rounds, at least one.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Delay before the round following `round` (1-based), or `None` once
    /// the last round has run.
    pub fn delay_after(&self, round: u32) -> Option<Duration> {
        if round == 0 || round >= self.rounds {
            return None;
        }

        let factor = 2u64.saturating_pow(round - 1);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        let jitter = match delay / 10 {
            0 => 0,
            range => rand::thread_rng().gen_range(0..range),
        };

        Some(Duration::from_millis(delay + jitter))
    }
}
