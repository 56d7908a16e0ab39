//! Esplora API Client
//!
//! Single-address lookups, chain tip, fee estimates and broadcast against an
//! Esplora-compatible REST API.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::types::{AddressStats, Transaction, Utxo};
use super::{Indexer, IndexerError};

/// Esplora API endpoints
pub const MAINNET_URL: &str = "https://blockstream.info/api";
pub const TESTNET_URL: &str = "https://blockstream.info/testnet/api";
pub const SIGNET_URL: &str = "https://mempool.space/signet/api";

/// Esplora HTTP client
#[derive(Debug, Clone)]
pub struct EsploraClient {
    client: Client,
    base_url: Url,
}

impl EsploraClient {
    /// Create a client whose every request is bounded by `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, IndexerError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| IndexerError::ParseError(format!("base url {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(IndexerError::ParseError(format!("base url {} has no path", base_url)));
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// Base URL with `segments` appended, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `/address/{address}[/suffix]`, the address kept inside its own segment
    fn address_endpoint(&self, address: &str, suffix: Option<&str>) -> Result<Url, IndexerError> {
        // Dot segments would be dropped by the URL path rules
        if address.is_empty() || address == "." || address == ".." {
            return Err(IndexerError::InvalidAddress(address.to_string()));
        }
        let mut segments = vec!["address", address];
        segments.extend(suffix);
        Ok(self.endpoint(&segments))
    }

    async fn get_text(&self, url: Url) -> Result<String, IndexerError> {
        let resp = self.client.get(url.clone()).send().await?;

        if !resp.status().is_success() {
            return Err(IndexerError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(resp.text().await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, IndexerError> {
        let resp = self.client.get(url.clone()).send().await?;

        if !resp.status().is_success() {
            return Err(IndexerError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Indexer for EsploraClient {
    async fn tip_height(&self) -> Result<u64, IndexerError> {
        let text = self.get_text(self.endpoint(&["blocks", "tip", "height"])).await?;

        text.trim()
            .parse()
            .map_err(|_| IndexerError::ParseError(format!("invalid block height: {}", text)))
    }

    async fn address_txs(&self, address: &str) -> Result<Vec<Transaction>, IndexerError> {
        self.get_json(self.address_endpoint(address, Some("txs"))?).await
    }

    async fn address_stats(&self, address: &str) -> Result<AddressStats, IndexerError> {
        let stats: AddressStats = self.get_json(self.address_endpoint(address, None)?).await?;
        if stats.address != address {
            return Err(IndexerError::ParseError(format!(
                "stats for {} returned for {}",
                stats.address, address
            )));
        }
        Ok(stats)
    }

    async fn address_utxos(&self, address: &str) -> Result<Vec<Utxo>, IndexerError> {
        self.get_json(self.address_endpoint(address, Some("utxo"))?).await
    }

    async fn fee_estimates(&self) -> Result<serde_json::Value, IndexerError> {
        self.get_json(self.endpoint(&["fee-estimates"])).await
    }

    async fn broadcast_tx(&self, raw_tx: &str) -> Result<String, IndexerError> {
        let url = self.endpoint(&["tx"]);
        let resp = self.client.post(url).body(raw_tx.to_string()).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(IndexerError::BroadcastRejected(error_text));
        }

        Ok(resp.text().await?)
    }
}
