//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::TechnicaConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const RPC_URL_ENV_VAR: &str = "INFURA_ENDPOINT";
pub const CONTRACT_ADDRESS_ENV_VAR: &str = "CONTRACT_ADDR";
pub const BIND_ADDRESS_ENV_VAR: &str = "TECHNICA_BIND_ADDRESS";
pub const CHAIN_ID_ENV_VAR: &str = "TECHNICA_CHAIN_ID";
pub const FAILOVER_URLS_ENV_VAR: &str = "TECHNICA_FAILOVER_URLS";
pub const LOG_LEVEL_ENV_VAR: &str = "TECHNICA_LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    EnvFile(dotenvy::Error),
    InvalidEnv { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::EnvFile(e) => write!(f, "Error loading env file: {}", e),
            ConfigError::InvalidEnv { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a dotenv file into the process environment.
///
/// Without an explicit path, `.env` in the working directory is optional.
/// An explicitly named file must exist. Variables already present in the
/// environment are never overwritten.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(path) => {
            dotenvy::from_path(path).map_err(ConfigError::EnvFile)?;
            tracing::debug!(path = %path.display(), "Loaded env file");
        }
        None => match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded env file"),
            Err(e) if e.not_found() => tracing::debug!("No .env file found, using process environment"),
            Err(e) => return Err(ConfigError::EnvFile(e)),
        },
    }
    Ok(())
}

/// Read a TOML configuration file without validating it.
pub fn read_config_file(path: &Path) -> Result<TechnicaConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Overlay environment values onto `config`.
///
/// `lookup` abstracts over the process environment so callers (and tests)
/// can supply their own source. Empty values count as unset.
pub fn apply_env<F>(config: &mut TechnicaConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| {
        lookup(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(url) = get(RPC_URL_ENV_VAR) {
        config.blockchain.rpc_url = url;
    }
    if let Some(addr) = get(CONTRACT_ADDRESS_ENV_VAR) {
        config.contract.address = addr;
    }
    if let Some(bind) = get(BIND_ADDRESS_ENV_VAR) {
        config.server.bind_address = bind;
    }
    if let Some(raw) = get(CHAIN_ID_ENV_VAR) {
        let chain_id = raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnv {
            var: CHAIN_ID_ENV_VAR,
            message: format!("'{}' is not a chain id: {}", raw, e),
        })?;
        config.blockchain.chain_id = Some(chain_id);
    }
    if let Some(raw) = get(FAILOVER_URLS_ENV_VAR) {
        config.blockchain.failover_urls = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(level) = get(LOG_LEVEL_ENV_VAR) {
        config.observability.log_level = level;
    }

    Ok(())
}

/// Load configuration from an optional TOML file plus the environment, then
/// validate the result.
pub fn load_config<F>(path: Option<&Path>, lookup: F) -> Result<TechnicaConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => TechnicaConfig::default(),
    };

    apply_env(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// [`load_config`] against the process environment.
pub fn load_config_from_env(path: Option<&Path>) -> Result<TechnicaConfig, ConfigError> {
    load_config(path, |var| std::env::var(var).ok())
}
