//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (--config)
//!     → .env file (dotenvy) merged into the process environment
//!     → environment variables (INFURA_ENDPOINT, CONTRACT_ADDR, ...)
//!     → validation.rs (semantic checks)
//!     → TechnicaConfig (validated, immutable)
//! ```
//!
//! The private key is not part of the configuration; the wallet reads it
//! directly from `PRIVATE_KEY`.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_from_env, load_env_file, ConfigError};
pub use schema::{
    BlockchainConfig, ContractConfig, ObservabilityConfig, ServerConfig, TechnicaConfig,
    TransactorConfig,
};
pub use validation::ValidationError;
