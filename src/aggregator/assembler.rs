//! Compound response assembly

use serde::Serialize;

use super::balance::AggregateBalance;
use super::fanout::Aggregated;
use super::transactions::AddressTransactions;

/// `{balance: {...}, transactions: [...]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceTransactions {
    pub balance: AggregateBalance,
    pub transactions: Vec<AddressTransactions>,
}

pub struct ResponseAssembler;

impl ResponseAssembler {
    /// Compose both aggregations of one address set; failures of either side are kept
    pub fn balance_transactions(
        balance: Aggregated<AggregateBalance>,
        transactions: Aggregated<Vec<AddressTransactions>>,
    ) -> Aggregated<BalanceTransactions> {
        let mut failures = balance.failures;
        failures.extend(transactions.failures);

        Aggregated {
            body: BalanceTransactions {
                balance: balance.body,
                transactions: transactions.body,
            },
            total: transactions.total.max(balance.total),
            failures,
        }
    }
}
