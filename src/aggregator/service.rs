//! Batch Service
//!
//! One linear pipeline per endpoint:
//! dedup → (height snapshot) → fan-out → merge → (assemble).
//!
//! The service holds no per-request state; everything a request owns lives in
//! its [`RequestContext`].

use std::sync::Arc;
use std::time::Duration;

use super::assembler::{BalanceTransactions, ResponseAssembler};
use super::balance::{AggregateBalance, BalanceAggregator};
use super::context::RequestContext;
use super::fanout::{Aggregated, FanOutExecutor};
use super::snapshot::ChainHeightSnapshot;
use super::transactions::{AddressTransactions, TransactionAggregator, TransactionLists};
use super::utxo::{UtxoAggregate, UtxoAggregator};
use crate::common::{
    log_fanout_event, log_upstream_failure, AggregatorError, BatchConfig, Result,
};
use crate::indexer::{EsploraClient, Indexer};

#[derive(Clone)]
pub struct BatchService {
    indexer: Arc<dyn Indexer>,
    transactions: TransactionAggregator,
    balances: BalanceAggregator,
    utxos: UtxoAggregator,
    snapshot_timeout: Duration,
    max_addresses: usize,
}

impl BatchService {
    pub fn new(
        indexer: Arc<dyn Indexer>,
        executor: FanOutExecutor,
        snapshot_timeout: Duration,
        max_addresses: usize,
    ) -> Self {
        Self {
            transactions: TransactionAggregator::new(indexer.clone(), executor.clone()),
            balances: BalanceAggregator::new(indexer.clone(), executor.clone()),
            utxos: UtxoAggregator::new(indexer.clone(), executor),
            indexer,
            snapshot_timeout,
            max_addresses,
        }
    }

    /// Build the service on top of an Esplora client
    pub fn from_config(config: &BatchConfig) -> Result<Self> {
        let client = EsploraClient::new(&config.esplora_url, config.upstream_timeout)
            .map_err(|e| AggregatorError::internal(format!("esplora client: {}", e)))?;
        let executor = FanOutExecutor::new(config.fanout_timeout)
            .with_max_concurrency(config.max_concurrency);

        Ok(Self::new(
            Arc::new(client),
            executor,
            config.upstream_timeout,
            config.max_addresses,
        ))
    }

    /// Deduplicate a request's addresses into its context
    pub fn context(&self, correlation_id: &str, raw: Vec<String>) -> Result<RequestContext> {
        RequestContext::from_raw(correlation_id, raw, self.max_addresses)
    }

    /// Per-address UTXO lists
    pub async fn utxos(&self, ctx: &RequestContext) -> Aggregated<UtxoAggregate> {
        let result = self.utxos.collect(ctx).await;
        report("utxos", ctx, &result);
        result
    }

    /// Per-address transactions with confirmation counts
    pub async fn data(&self, ctx: &RequestContext) -> Result<Aggregated<Vec<AddressTransactions>>> {
        let Some(snapshot) = self.snapshot(ctx).await? else {
            return Ok(Aggregated::complete(Vec::new(), 0));
        };

        let result = self.transactions.collect(ctx, snapshot).await;
        report("data", ctx, &result);
        Ok(result)
    }

    /// Net balance plus per-address transactions, over one snapshot
    pub async fn balance_transactions(
        &self,
        ctx: &RequestContext,
    ) -> Result<Aggregated<BalanceTransactions>> {
        let Some(snapshot) = self.snapshot(ctx).await? else {
            return Ok(ResponseAssembler::balance_transactions(
                Aggregated::complete(AggregateBalance::default(), 0),
                Aggregated::complete(Vec::new(), 0),
            ));
        };

        let (balance, transactions) = self.transactions.collect_with_balance(ctx, snapshot).await;

        let result = ResponseAssembler::balance_transactions(balance, transactions);
        report("baltxs", ctx, &result);
        Ok(result)
    }

    /// Net balance across all addresses
    pub async fn balances(&self, ctx: &RequestContext) -> Aggregated<AggregateBalance> {
        let result = self.balances.collect(ctx).await;
        report("balances", ctx, &result);
        result
    }

    /// Raw transaction lists per address
    pub async fn transactions(&self, ctx: &RequestContext) -> Aggregated<TransactionLists> {
        let result = self.transactions.lists(ctx).await;
        report("txs", ctx, &result);
        result
    }

    /// Indexer fee estimates, passed through
    pub async fn fee_estimates(&self) -> Result<serde_json::Value> {
        Ok(self.indexer.fee_estimates().await?)
    }

    /// Forward a raw transaction to the indexer
    pub async fn broadcast(&self, raw_tx: &str) -> Result<serde_json::Value> {
        let raw_tx = raw_tx.trim();
        if raw_tx.is_empty() {
            return Err(AggregatorError::malformed("empty transaction body"));
        }

        let reply = self.indexer.broadcast_tx(raw_tx).await?;
        Ok(passthrough(reply))
    }

    /// Capture the height once; an empty request needs none
    async fn snapshot(&self, ctx: &RequestContext) -> Result<Option<ChainHeightSnapshot>> {
        if ctx.addresses().is_empty() {
            return Ok(None);
        }
        ChainHeightSnapshot::capture(self.indexer.as_ref(), self.snapshot_timeout)
            .await
            .map(Some)
    }
}

/// JSON replies pass as-is, anything else (a bare txid) becomes a JSON string
fn passthrough(reply: String) -> serde_json::Value {
    let trimmed = reply.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Ok(value) = serde_json::from_str(trimmed) {
            return value;
        }
    }
    serde_json::Value::String(trimmed.to_string())
}

fn report<B>(operation: &str, ctx: &RequestContext, result: &Aggregated<B>) {
    for failure in &result.failures {
        log_upstream_failure(
            operation,
            ctx.correlation_id(),
            &failure.address,
            &failure.error.to_string(),
        );
    }

    let partial = result.is_partial().then(|| AggregatorError::PartialFailure {
        failed: result.failures.len(),
        total: result.total,
    });
    log_fanout_event(
        operation,
        ctx.correlation_id(),
        result.total,
        partial.as_ref(),
        ctx.elapsed_ms(),
    );
}
