//! Batch aggregation over a single-address indexer
//!
//! - `dedup` - request address normalization
//! - `snapshot` - one chain height per request
//! - `fanout` - concurrent per-address dispatch with a join barrier
//! - `transactions`, `balance`, `utxo` - per-endpoint merge rules
//! - `assembler` - compound response bodies
//! - `service` - endpoint pipelines

pub mod assembler;
pub mod balance;
pub mod context;
pub mod dedup;
pub mod fanout;
pub mod service;
pub mod snapshot;
pub mod transactions;
pub mod utxo;

pub use assembler::{BalanceTransactions, ResponseAssembler};
pub use balance::{AggregateBalance, BalanceAggregator};
pub use context::RequestContext;
pub use dedup::{Address, AddressSet};
pub use fanout::{Aggregated, FanOutExecutor, FanOutOutcome, SlotError, SlotFailure};
pub use service::BatchService;
pub use snapshot::ChainHeightSnapshot;
pub use transactions::{AddressTransactions, TransactionAggregator, TransactionLists};
pub use utxo::{UtxoAggregate, UtxoAggregator};
