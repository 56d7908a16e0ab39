//! Environment-based Configuration for addrbatch
//!
//! # Environment Variables
//!
//! ## Upstream
//! - `ADDRBATCH_NETWORK` - "mainnet", "testnet" or "signet" (default: "testnet")
//! - `ADDRBATCH_ESPLORA_URL` - Esplora API base URL (default depends on network)
//! - `ADDRBATCH_UPSTREAM_TIMEOUT_MS` - Per-call indexer timeout (default: 8000)
//!
//! ## Fan-out
//! - `ADDRBATCH_FANOUT_TIMEOUT_MS` - Deadline for one batch fan-out (default: 10000)
//! - `ADDRBATCH_MAX_CONCURRENCY` - In-flight upstream calls per batch, 0 = unbounded (default: 32)
//! - `ADDRBATCH_MAX_ADDRESSES` - Largest accepted address list (default: 1000)
//!
//! ## Server
//! - `ADDRBATCH_PORT` - REST API port (default: 3001)
//! - `ADDRBATCH_LOG_LEVEL` - Logging level (debug, info, warn, error)
//! - `ADDRBATCH_LOG_JSON` - "1" for JSON logs (default: on for mainnet)

use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::indexer::{MAINNET_URL, SIGNET_URL, TESTNET_URL};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("{0} must be greater than zero")]
    ZeroValue(String),
}

/// Bitcoin network served by the upstream indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Signet,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "signet" => Ok(Network::Signet),
            _ => Err(ConfigError::InvalidValue(
                "ADDRBATCH_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

impl Network {
    /// Get default Esplora API for this network
    pub fn default_esplora_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_URL,
            Network::Testnet => TESTNET_URL,
            Network::Signet => SIGNET_URL,
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Network environment
    pub network: Network,

    /// Esplora API endpoint
    pub esplora_url: String,

    /// REST API port
    pub port: u16,

    /// Per-call timeout for indexer requests, also bounds the height snapshot
    pub upstream_timeout: Duration,

    /// Deadline for a whole fan-out
    pub fanout_timeout: Duration,

    /// In-flight upstream calls per fan-out (None = one task per address, unbounded)
    pub max_concurrency: Option<usize>,

    /// Largest accepted address list
    pub max_addresses: usize,

    /// Log level
    pub log_level: String,

    /// Emit JSON logs
    pub log_json: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let network = Network::Testnet;
        Self {
            network,
            esplora_url: network.default_esplora_url().to_string(),
            port: 3001,
            upstream_timeout: Duration::from_millis(8_000),
            fanout_timeout: Duration::from_millis(10_000),
            max_concurrency: Some(32),
            max_addresses: 1_000,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl BatchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let network: Network = env::var("ADDRBATCH_NETWORK")
            .unwrap_or_else(|_| "testnet".to_string())
            .parse()?;

        let esplora_url = env::var("ADDRBATCH_ESPLORA_URL")
            .unwrap_or_else(|_| network.default_esplora_url().to_string());

        let port = parse_var("ADDRBATCH_PORT", 3001u16)?;

        let upstream_timeout =
            Duration::from_millis(parse_nonzero("ADDRBATCH_UPSTREAM_TIMEOUT_MS", 8_000)?);
        let fanout_timeout =
            Duration::from_millis(parse_nonzero("ADDRBATCH_FANOUT_TIMEOUT_MS", 10_000)?);

        let max_concurrency = match parse_var("ADDRBATCH_MAX_CONCURRENCY", 32usize)? {
            0 => None,
            n => Some(n),
        };

        let max_addresses = parse_nonzero("ADDRBATCH_MAX_ADDRESSES", 1_000)? as usize;

        let log_level = env::var("ADDRBATCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_json = env::var("ADDRBATCH_LOG_JSON")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(network == Network::Mainnet);

        Ok(Self {
            network,
            esplora_url,
            port,
            upstream_timeout,
            fanout_timeout,
            max_concurrency,
            max_addresses,
            log_level,
            log_json,
        })
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("=== addrbatch Configuration ===");
        println!("Network: {:?}", self.network);
        println!("Esplora API: {}", self.esplora_url);
        println!("Port: {}", self.port);
        println!("Upstream Timeout: {} ms", self.upstream_timeout.as_millis());
        println!("Fan-out Timeout: {} ms", self.fanout_timeout.as_millis());
        println!(
            "Max Concurrency: {}",
            self.max_concurrency
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unbounded".to_string())
        );
        println!("Max Addresses: {}", self.max_addresses);
        println!("Log Level: {}", self.log_level);
        println!("===============================");
    }
}

/// Parse an env var, falling back to `default` when unset
fn parse_var<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(var_name) {
        Ok(value) => value.trim().parse().map_err(|_| {
            ConfigError::InvalidValue(var_name.to_string(), format!("cannot parse '{}'", value))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_nonzero(var_name: &str, default: u64) -> Result<u64, ConfigError> {
    let value = parse_var(var_name, default)?;
    if value == 0 {
        return Err(ConfigError::ZeroValue(var_name.to_string()));
    }
    Ok(value)
}
