//! Scriptable in-memory indexer for tests
//!
//! Each address can be given canned data, an artificial latency, or a forced
//! failure. Every call is counted so tests can assert on upstream traffic.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::types::{AddressStats, Transaction, TxoStats, Utxo};
use super::{Indexer, IndexerError};

#[derive(Debug, Clone, Default)]
pub struct StubAddress {
    pub txs: Vec<Transaction>,
    pub stats: AddressStats,
    pub utxos: Vec<Utxo>,
    pub delay: Duration,
    pub fail: bool,
    pub fail_stats: bool,
}

#[derive(Debug, Default)]
pub struct StubIndexer {
    pub height: Option<u64>,
    pub height_delay: Duration,
    pub addresses: HashMap<String, StubAddress>,
    calls: AtomicUsize,
    height_calls: AtomicUsize,
}

impl StubIndexer {
    pub fn new(height: u64) -> Self {
        Self {
            height: Some(height),
            ..Default::default()
        }
    }

    /// Tip height lookups fail
    pub fn without_height() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: &str, data: StubAddress) -> Self {
        self.addresses.insert(address.to_string(), data);
        self
    }

    /// Address whose confirmed balance is `sats`
    pub fn with_balance(self, address: &str, sats: u64, delay: Duration) -> Self {
        let stats = AddressStats {
            address: address.to_string(),
            chain_stats: TxoStats {
                funded_txo_count: 1,
                funded_txo_sum: sats,
                tx_count: 1,
                ..Default::default()
            },
            mempool_stats: TxoStats::default(),
        };
        self.with_address(
            address,
            StubAddress {
                stats,
                delay,
                ..Default::default()
            },
        )
    }

    pub fn with_failing(self, address: &str) -> Self {
        self.with_address(
            address,
            StubAddress {
                fail: true,
                ..Default::default()
            },
        )
    }

    /// Per-address calls issued so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn height_calls(&self) -> usize {
        self.height_calls.load(Ordering::SeqCst)
    }

    async fn lookup(&self, address: &str) -> Result<StubAddress, IndexerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let entry = self.addresses.get(address).cloned().unwrap_or_default();

        if !entry.delay.is_zero() {
            tokio::time::sleep(entry.delay).await;
        }
        if entry.fail {
            return Err(IndexerError::Unavailable(format!("no data for {}", address)));
        }
        Ok(entry)
    }
}

#[async_trait]
impl Indexer for StubIndexer {
    async fn tip_height(&self) -> Result<u64, IndexerError> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        if !self.height_delay.is_zero() {
            tokio::time::sleep(self.height_delay).await;
        }
        self.height
            .ok_or_else(|| IndexerError::Unavailable("tip height".to_string()))
    }

    async fn address_txs(&self, address: &str) -> Result<Vec<Transaction>, IndexerError> {
        Ok(self.lookup(address).await?.txs)
    }

    async fn address_stats(&self, address: &str) -> Result<AddressStats, IndexerError> {
        let entry = self.lookup(address).await?;
        if entry.fail_stats {
            return Err(IndexerError::Unavailable(format!("no stats for {}", address)));
        }
        Ok(entry.stats)
    }

    async fn address_utxos(&self, address: &str) -> Result<Vec<Utxo>, IndexerError> {
        Ok(self.lookup(address).await?.utxos)
    }

    async fn fee_estimates(&self) -> Result<serde_json::Value, IndexerError> {
        Ok(serde_json::json!({ "1": 25.0, "3": 12.0, "144": 1.0 }))
    }

    async fn broadcast_tx(&self, raw_tx: &str) -> Result<String, IndexerError> {
        if raw_tx.starts_with("02") {
            Ok("4e5f".to_string())
        } else {
            Err(IndexerError::BroadcastRejected("TX decode failed".to_string()))
        }
    }
}
