//! Balance aggregation
//!
//! Each task yields the balance of its own address; the totals are folded in
//! one pass after the join, so no accumulator is shared between tasks.

use serde::Serialize;
use std::sync::Arc;

use super::context::RequestContext;
use super::fanout::{Aggregated, FanOutExecutor};
use crate::indexer::{AddressBalance, Indexer, IndexerError};

/// Net balance of an address set, in satoshis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateBalance {
    pub balance: i64,
    pub unconfirmed_balance: i64,
}

impl AggregateBalance {
    pub fn add(self, other: AddressBalance) -> Self {
        Self {
            balance: self.balance.saturating_add(other.confirmed),
            unconfirmed_balance: self.unconfirmed_balance.saturating_add(other.unconfirmed),
        }
    }
}

impl FromIterator<AddressBalance> for AggregateBalance {
    fn from_iter<I: IntoIterator<Item = AddressBalance>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), Self::add)
    }
}

#[derive(Clone)]
pub struct BalanceAggregator {
    indexer: Arc<dyn Indexer>,
    executor: FanOutExecutor,
}

impl BalanceAggregator {
    pub fn new(indexer: Arc<dyn Indexer>, executor: FanOutExecutor) -> Self {
        Self { indexer, executor }
    }

    /// Sum confirmed and unconfirmed balances; failed addresses count as zero
    pub async fn collect(&self, ctx: &RequestContext) -> Aggregated<AggregateBalance> {
        let indexer = self.indexer.clone();

        let outcome = self
            .executor
            .run(ctx.addresses(), move |address| {
                let indexer = indexer.clone();
                async move {
                    let stats = indexer.address_stats(&address).await?;
                    Ok::<_, IndexerError>(stats.balance())
                }
            })
            .await;

        outcome.merge(|slots| slots.into_iter().flatten().collect())
    }
}
