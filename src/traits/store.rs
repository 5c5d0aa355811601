//! Async store traits consumed by the observer
//!
//! The pipeline needs no cross-store transactionality. Each write is expected to
//! be durable once the call returns.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::protocol::operation::AnchoredOperationModel;
use crate::traits::ledger::Transaction;

/// Persisted decoded operations
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Insert operations, replacing any with the same
    /// (DID suffix, transaction number, operation index)
    async fn insert_or_replace(&self, operations: &[AnchoredOperationModel])
        -> Result<(), StorageError>;

    /// Delete operations with transaction number greater than `after`, or all if `None`
    async fn delete(&self, after_transaction_number: Option<u64>) -> Result<(), StorageError>;

    /// All operations for a DID, ordered by (transaction number, operation index)
    async fn get(&self, did_unique_suffix: &str) -> Result<Vec<AnchoredOperationModel>, StorageError>;
}

/// Committed transactions, in strictly increasing transaction number order
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Transaction with the highest transaction number
    async fn last_transaction(&self) -> Result<Option<Transaction>, StorageError>;

    /// Commit a transaction (idempotent)
    async fn add_transaction(&self, transaction: &Transaction) -> Result<(), StorageError>;

    /// Transactions with `from_inclusive <= transaction_time < to_exclusive`
    async fn transactions_starting_from(
        &self,
        from_time_inclusive: u64,
        to_time_exclusive: u64,
    ) -> Result<Vec<Transaction>, StorageError>;

    /// Most recent first, with the gap between samples doubling going backward
    async fn exponentially_spaced_transactions(&self) -> Result<Vec<Transaction>, StorageError>;

    /// Remove transactions with number greater than `n`, or all if `None`
    async fn remove_transactions_later_than(
        &self,
        transaction_number: Option<u64>,
    ) -> Result<(), StorageError>;

    /// All committed transactions in transaction number order
    async fn transactions(&self) -> Result<Vec<Transaction>, StorageError>;
}

/// Retry bookkeeping for transactions whose files could not be fetched
#[async_trait]
pub trait UnresolvableTransactionStore: Send + Sync {
    /// Record a failed fetch attempt and schedule the next retry
    async fn record_fetch_attempt(&self, transaction: &Transaction) -> Result<(), StorageError>;

    /// Forget a transaction (after it resolved)
    async fn remove(&self, transaction: &Transaction) -> Result<(), StorageError>;

    /// Transactions whose next retry time has passed, oldest first
    async fn due_for_retry(&self, max_count: Option<usize>) -> Result<Vec<Transaction>, StorageError>;

    /// Remove records with transaction number greater than `n`, or all if `None`
    async fn remove_later_than(&self, transaction_number: Option<u64>) -> Result<(), StorageError>;
}

/// Ledger confirmation state of an anchor string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRecord {
    pub anchor_string: String,
    pub confirmed_at: Option<u64>,
}

/// Tracks at which ledger time each anchor string was observed
#[async_trait]
pub trait ConfirmationStore: Send + Sync {
    /// Record that `anchor_string` was seen at ledger time `confirmed_at`
    async fn confirm(&self, anchor_string: &str, confirmed_at: u64) -> Result<(), StorageError>;

    /// Clear confirmations later than `confirmed_at`, or all if `None`
    async fn reset_after(&self, confirmed_at: Option<u64>) -> Result<(), StorageError>;

    async fn get(&self, anchor_string: &str) -> Result<Option<ConfirmationRecord>, StorageError>;
}
