//! addrbatch - Batch Address Queries over a Single-Address Indexer
//!
//! Wallets track many addresses; Esplora-style indexers answer for one address
//! at a time. This service accepts a list of addresses, fans the lookups out
//! concurrently, and merges the answers into one response.
//!
//! ## Modules
//!
//! - `indexer` - the upstream indexer seam and its Esplora client
//! - `aggregator` - dedup, height snapshot, fan-out/fan-in, merge rules
//! - `api` - axum routes and middleware
//! - `common` - configuration, errors, logging

pub mod aggregator;
pub mod api;
pub mod common;
pub mod indexer;

// Re-exports: aggregation
pub use aggregator::{
    AddressSet, AddressTransactions, AggregateBalance, Aggregated, BalanceTransactions,
    BatchService, ChainHeightSnapshot, FanOutExecutor, RequestContext, SlotError, SlotFailure,
    TransactionLists, UtxoAggregate,
};

// Re-exports: indexer
pub use indexer::{EsploraClient, Indexer, IndexerError, Transaction, TxStatus, Utxo};

// Re-exports: infrastructure
pub use common::{AggregatorError, BatchConfig, Network};
