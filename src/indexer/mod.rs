//! Indexer Module
//!
//! The upstream single-address indexer seen as a black box:
//! - `Indexer` trait, the only seam the aggregators depend on
//! - Esplora HTTP implementation
//! - Wire types shared with the API responses

pub mod esplora;
pub mod types;

#[cfg(test)]
pub(crate) mod stub;

use async_trait::async_trait;
use thiserror::Error;

pub use esplora::{EsploraClient, MAINNET_URL, SIGNET_URL, TESTNET_URL};
pub use types::{AddressBalance, AddressStats, Transaction, TxStatus, TxoStats, Utxo};

/// Indexer error types
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("indexer returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Broadcast rejected: {0}")]
    BroadcastRejected(String),

    #[error("address {0:?} cannot be queried")]
    InvalidAddress(String),

    #[error("Indexer unavailable: {0}")]
    Unavailable(String),
}

/// Operations consumed from the upstream indexer
///
/// Implementations:
/// - `EsploraClient` - Esplora REST API
/// - `MockIndexer` (tests) - generated by mockall
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Current best block height
    async fn tip_height(&self) -> Result<u64, IndexerError>;

    /// Transactions touching an address, newest first
    async fn address_txs(&self, address: &str) -> Result<Vec<Transaction>, IndexerError>;

    /// Funded/spent statistics for an address
    async fn address_stats(&self, address: &str) -> Result<AddressStats, IndexerError>;

    /// Unspent outputs of an address
    async fn address_utxos(&self, address: &str) -> Result<Vec<Utxo>, IndexerError>;

    /// Fee estimates keyed by confirmation target
    async fn fee_estimates(&self) -> Result<serde_json::Value, IndexerError>;

    /// Submit a raw transaction, returns the indexer's reply body
    async fn broadcast_tx(&self, raw_tx: &str) -> Result<String, IndexerError>;
}
