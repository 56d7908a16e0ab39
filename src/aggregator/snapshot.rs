//! Chain height snapshot
//!
//! Captured once per request that reports confirmation counts. Every
//! transaction of that request is scored against this one value.

use std::time::Duration;

use crate::common::AggregatorError;
use crate::indexer::{Indexer, Transaction, TxStatus};

/// Tip height observed at the start of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainHeightSnapshot {
    height: u64,
}

impl ChainHeightSnapshot {
    pub fn at(height: u64) -> Self {
        Self { height }
    }

    /// Query the indexer tip once, bounded by `timeout`
    pub async fn capture(
        indexer: &dyn Indexer,
        timeout: Duration,
    ) -> Result<Self, AggregatorError> {
        match tokio::time::timeout(timeout, indexer.tip_height()).await {
            Ok(Ok(height)) => Ok(Self { height }),
            Ok(Err(e)) => Err(AggregatorError::upstream(format!("chain height: {}", e))),
            Err(_) => Err(AggregatorError::upstream(format!(
                "chain height: no response within {} ms",
                timeout.as_millis()
            ))),
        }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    /// 0 when unconfirmed, else snapshot height minus block height
    pub fn confirmations(&self, status: &TxStatus) -> u64 {
        if !status.confirmed {
            return 0;
        }
        // An indexer ahead of the snapshot yields 0, not an underflow
        let block_height = status.block_height.unwrap_or(self.height);
        self.height.saturating_sub(block_height)
    }

    /// Fill the derived confirmation count of every transaction
    pub fn apply(&self, transactions: &mut [Transaction]) {
        for tx in transactions.iter_mut() {
            tx.confirmations = Some(self.confirmations(&tx.status));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::stub::StubIndexer;
    use crate::indexer::{IndexerError, MockIndexer};

    #[test]
    fn test_confirmation_count() {
        let snapshot = ChainHeightSnapshot::at(700_000);

        assert_eq!(snapshot.confirmations(&TxStatus::confirmed_at(699_995)), 5);
        assert_eq!(snapshot.confirmations(&TxStatus::confirmed_at(700_000)), 0);
        assert_eq!(snapshot.confirmations(&TxStatus::unconfirmed()), 0);
    }

    #[test]
    fn test_block_above_snapshot_is_not_negative() {
        let snapshot = ChainHeightSnapshot::at(700_000);
        assert_eq!(snapshot.confirmations(&TxStatus::confirmed_at(700_002)), 0);
    }

    #[test]
    fn test_apply_sets_every_transaction() {
        let snapshot = ChainHeightSnapshot::at(800_010);
        let mut txs = vec![
            Transaction::new("a", TxStatus::confirmed_at(800_000)),
            Transaction::new("b", TxStatus::unconfirmed()),
        ];

        snapshot.apply(&mut txs);
        assert_eq!(txs[0].confirmations, Some(10));
        assert_eq!(txs[1].confirmations, Some(0));
    }

    #[tokio::test]
    async fn test_capture_queries_tip_once() {
        let mut indexer = MockIndexer::new();
        indexer.expect_tip_height().times(1).returning(|| Ok(812_345));

        let snapshot = ChainHeightSnapshot::capture(&indexer, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(snapshot.height(), 812_345);
    }

    #[tokio::test]
    async fn test_capture_error_is_upstream_unavailable() {
        let mut indexer = MockIndexer::new();
        indexer
            .expect_tip_height()
            .returning(|| Err(IndexerError::Unavailable("503".to_string())));

        let err = ChainHeightSnapshot::capture(&indexer, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_capture_timeout_is_upstream_unavailable() {
        let mut indexer = StubIndexer::new(1);
        indexer.height_delay = Duration::from_millis(500);

        let err = ChainHeightSnapshot::capture(&indexer, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, AggregatorError::UpstreamUnavailable(msg) if msg.contains("50 ms")));
    }
}
