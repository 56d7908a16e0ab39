//! UTXO aggregation
//!
//! UTXO lists stay grouped by address: entry `i` holds the outputs of
//! `AddressSet[i]`, and a failed address leaves an empty list.

use serde::Serialize;
use std::sync::Arc;

use super::context::RequestContext;
use super::fanout::{Aggregated, FanOutExecutor};
use crate::indexer::{Indexer, Utxo};

/// Per-address UTXO lists, serialized as `[[utxo]]`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UtxoAggregate {
    pub per_address: Vec<Vec<Utxo>>,
}

impl UtxoAggregate {
    /// All outputs in one list, address grouping dropped
    pub fn flatten(&self) -> Vec<Utxo> {
        self.per_address.iter().flatten().cloned().collect()
    }

    pub fn total_value(&self) -> u64 {
        self.per_address.iter().flatten().map(|u| u.value).sum()
    }
}

#[derive(Clone)]
pub struct UtxoAggregator {
    indexer: Arc<dyn Indexer>,
    executor: FanOutExecutor,
}

impl UtxoAggregator {
    pub fn new(indexer: Arc<dyn Indexer>, executor: FanOutExecutor) -> Self {
        Self { indexer, executor }
    }

    pub async fn collect(&self, ctx: &RequestContext) -> Aggregated<UtxoAggregate> {
        let indexer = self.indexer.clone();

        let outcome = self
            .executor
            .run(ctx.addresses(), move |address| {
                let indexer = indexer.clone();
                async move { indexer.address_utxos(&address).await }
            })
            .await;

        outcome.merge(|slots| UtxoAggregate {
            per_address: slots.into_iter().map(Option::unwrap_or_default).collect(),
        })
    }
}
