//! Indexer wire types
//!
//! Shapes follow the Esplora REST API. Transactions keep every field the
//! indexer sends; only the fields the aggregators read are typed.

use serde::{Deserialize, Serialize};

/// Confirmation status of a transaction or output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatus {
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_time: Option<u64>,
}

impl TxStatus {
    pub fn unconfirmed() -> Self {
        Self {
            confirmed: false,
            block_height: None,
            block_hash: None,
            block_time: None,
        }
    }

    pub fn confirmed_at(height: u64) -> Self {
        Self {
            confirmed: true,
            block_height: Some(height),
            block_hash: None,
            block_time: None,
        }
    }
}

/// Indexer transaction record plus the derived confirmation count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub txid: String,
    pub status: TxStatus,
    /// Blocks mined on top of the containing block, relative to the request's
    /// height snapshot. Absent when no snapshot was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    /// Remaining indexer fields (vin, vout, fee, weight...) passed through
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Transaction {
    pub fn new(txid: impl Into<String>, status: TxStatus) -> Self {
        Self {
            txid: txid.into(),
            status,
            confirmations: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Unspent transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    pub status: TxStatus,
}

/// Funded/spent output totals for one side (chain or mempool)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxoStats {
    pub funded_txo_count: u64,
    pub funded_txo_sum: u64,
    pub spent_txo_count: u64,
    pub spent_txo_sum: u64,
    pub tx_count: u64,
}

impl TxoStats {
    /// Net value in satoshis, negative when more was spent than funded
    pub fn net_sats(&self) -> i64 {
        let funded = i64::try_from(self.funded_txo_sum).unwrap_or(i64::MAX);
        let spent = i64::try_from(self.spent_txo_sum).unwrap_or(i64::MAX);
        funded.saturating_sub(spent)
    }
}

/// `GET /address/:address` payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressStats {
    pub address: String,
    #[serde(default)]
    pub chain_stats: TxoStats,
    #[serde(default)]
    pub mempool_stats: TxoStats,
}

impl AddressStats {
    pub fn balance(&self) -> AddressBalance {
        AddressBalance {
            confirmed: self.chain_stats.net_sats(),
            unconfirmed: self.mempool_stats.net_sats(),
        }
    }
}

/// Balance of one address in satoshis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressBalance {
    pub confirmed: i64,
    pub unconfirmed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "txid": "ab12",
            "version": 2,
            "fee": 141,
            "status": {"confirmed": true, "block_height": 699995, "block_hash": "00ff"}
        });

        let tx: Transaction = serde_json::from_value(raw).unwrap();
        assert_eq!(tx.status.block_height, Some(699995));
        assert_eq!(tx.confirmations, None);
        assert_eq!(tx.extra.get("fee"), Some(&serde_json::json!(141)));

        let out = serde_json::to_value(&tx).unwrap();
        assert_eq!(out["version"], 2);
        assert!(out.get("confirmations").is_none());
    }

    #[test]
    fn test_balance_from_stats() {
        let stats: AddressStats = serde_json::from_value(serde_json::json!({
            "address": "tb1qexample",
            "chain_stats": {
                "funded_txo_count": 3, "funded_txo_sum": 50_000,
                "spent_txo_count": 1, "spent_txo_sum": 20_000, "tx_count": 4
            },
            "mempool_stats": {
                "funded_txo_count": 0, "funded_txo_sum": 0,
                "spent_txo_count": 1, "spent_txo_sum": 5_000, "tx_count": 1
            }
        }))
        .unwrap();

        let balance = stats.balance();
        assert_eq!(balance.confirmed, 30_000);
        assert_eq!(balance.unconfirmed, -5_000);
    }

    #[test]
    fn test_stats_require_address() {
        let parsed = serde_json::from_value::<AddressStats>(serde_json::json!({"1": 20.5}));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_net_sats_saturates() {
        let huge = TxoStats {
            funded_txo_sum: u64::MAX,
            ..Default::default()
        };
        assert_eq!(huge.net_sats(), i64::MAX);

        let overspent = TxoStats {
            spent_txo_sum: u64::MAX,
            ..Default::default()
        };
        assert_eq!(overspent.net_sats(), -i64::MAX);
    }
}
