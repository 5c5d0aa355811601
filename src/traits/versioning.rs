//! Per-protocol-version capabilities looked up by ledger time

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ObserverResult;
use crate::traits::ledger::Transaction;

/// Resolves one anchored transaction into stored operations
#[async_trait]
pub trait TransactionProcessor: Send + Sync {
    /// Returns `true` if no further attempt is needed, either because the
    /// batch was stored or because it is permanently invalid.
    async fn process_transaction(&self, transaction: &Transaction) -> ObserverResult<bool>;
}

/// Picks the transactions of one ledger time that fit the throughput quota
#[async_trait]
pub trait TransactionSelector: Send + Sync {
    /// All `transactions` must share one transaction time
    async fn select_qualified_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> ObserverResult<Vec<Transaction>>;
}

/// Maps a ledger time to the protocol implementation active at that time
pub trait VersionManager: Send + Sync {
    fn transaction_processor(&self, transaction_time: u64)
        -> ObserverResult<Arc<dyn TransactionProcessor>>;

    fn transaction_selector(&self, transaction_time: u64)
        -> ObserverResult<Arc<dyn TransactionSelector>>;
}
