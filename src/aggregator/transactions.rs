//! Transaction aggregation
//!
//! Per address, the transaction list and the address stats are fetched as two
//! sibling requests inside the same fan-out task. Confirmation counts come
//! from the request's single [`ChainHeightSnapshot`]; the stats also carry the
//! address balance, so the compound endpoint needs no second fan-out.

use serde::Serialize;
use std::sync::Arc;

use super::balance::AggregateBalance;
use super::context::RequestContext;
use super::fanout::{Aggregated, FanOutExecutor, FanOutOutcome, SlotError, SlotFailure};
use super::snapshot::ChainHeightSnapshot;
use crate::indexer::{AddressStats, Indexer, IndexerError, Transaction};

/// Transactions and counts for one address
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressTransactions {
    pub address: String,
    pub total_transactions: u64,
    pub confirmed_count: u64,
    pub unconfirmed_count: u64,
    pub transactions: Vec<Transaction>,
}

impl AddressTransactions {
    /// Entry for an address whose lookup failed
    pub fn empty(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            total_transactions: 0,
            confirmed_count: 0,
            unconfirmed_count: 0,
            transactions: Vec::new(),
        }
    }
}

/// `{txs: [[transaction]]}`, one list per address
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionLists {
    pub txs: Vec<Vec<Transaction>>,
}

/// Both sub-requests of one address, each kept with its own outcome
struct AddressHistory {
    txs: Result<Vec<Transaction>, IndexerError>,
    stats: Result<AddressStats, IndexerError>,
}

#[derive(Clone)]
pub struct TransactionAggregator {
    indexer: Arc<dyn Indexer>,
    executor: FanOutExecutor,
}

impl TransactionAggregator {
    pub fn new(indexer: Arc<dyn Indexer>, executor: FanOutExecutor) -> Self {
        Self { indexer, executor }
    }

    /// One entry per address, in request order, scored against `snapshot`
    pub async fn collect(
        &self,
        ctx: &RequestContext,
        snapshot: ChainHeightSnapshot,
    ) -> Aggregated<Vec<AddressTransactions>> {
        self.collect_with_balance(ctx, snapshot).await.1
    }

    /// Transactions plus the balance summed from the same stats responses.
    ///
    /// An address reports at most one failure: the transaction fetch if that
    /// failed, else the stats fetch. Failures are carried on the transaction
    /// side only.
    pub async fn collect_with_balance(
        &self,
        ctx: &RequestContext,
        snapshot: ChainHeightSnapshot,
    ) -> (Aggregated<AggregateBalance>, Aggregated<Vec<AddressTransactions>>) {
        let indexer = self.indexer.clone();

        let outcome = self
            .executor
            .run(ctx.addresses(), move |address| {
                let indexer = indexer.clone();
                async move {
                    let (txs, stats) = tokio::join!(
                        indexer.address_txs(&address),
                        indexer.address_stats(&address)
                    );
                    Ok::<_, IndexerError>(AddressHistory { txs, stats })
                }
            })
            .await;

        let FanOutOutcome { slots, mut failures } = outcome;
        let total = slots.len();
        let mut entries = Vec::with_capacity(total);
        let mut balance = AggregateBalance::default();

        for (index, (slot, address)) in slots.into_iter().zip(ctx.addresses()).enumerate() {
            let Some(history) = slot else {
                entries.push(AddressTransactions::empty(address.as_str()));
                continue;
            };

            let (confirmed_count, unconfirmed_count, stats_error) = match history.stats {
                Ok(stats) => {
                    balance = balance.add(stats.balance());
                    (stats.chain_stats.tx_count, stats.mempool_stats.tx_count, None)
                }
                Err(e) => (0, 0, Some(e)),
            };

            let error = match history.txs {
                Ok(mut transactions) => {
                    snapshot.apply(&mut transactions);
                    entries.push(AddressTransactions {
                        address: address.clone(),
                        total_transactions: transactions.len() as u64,
                        confirmed_count,
                        unconfirmed_count,
                        transactions,
                    });
                    stats_error
                }
                Err(e) => {
                    entries.push(AddressTransactions::empty(address.as_str()));
                    Some(e)
                }
            };

            if let Some(e) = error {
                failures.push(SlotFailure {
                    index,
                    address: address.clone(),
                    error: SlotError::Upstream(e),
                });
            }
        }
        failures.sort_by_key(|f| f.index);

        (
            Aggregated::complete(balance, total),
            Aggregated {
                body: entries,
                total,
                failures,
            },
        )
    }

    /// Raw transaction lists per address, without confirmation data
    pub async fn lists(&self, ctx: &RequestContext) -> Aggregated<TransactionLists> {
        let indexer = self.indexer.clone();

        let outcome = self
            .executor
            .run(ctx.addresses(), move |address| {
                let indexer = indexer.clone();
                async move { indexer.address_txs(&address).await }
            })
            .await;

        outcome.merge(|slots| TransactionLists {
            txs: slots.into_iter().map(Option::unwrap_or_default).collect(),
        })
    }
}
