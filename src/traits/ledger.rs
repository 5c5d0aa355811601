//! Ledger client trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// An anchoring transaction as reported by the ledger
///
/// `(transaction_time, transaction_number)` totally orders all transactions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Strictly increasing, ledger-assigned number
    pub transaction_number: u64,

    /// Ledger timestamp (block height)
    pub transaction_time: u64,

    /// Hash of the block at `transaction_time`
    pub transaction_time_hash: String,

    /// `<numberOfOperations>.<coreIndexFileUri>`
    pub anchor_string: String,

    /// Fee paid by the writer
    pub transaction_fee_paid: u64,

    /// Ledger-normalized fee at `transaction_time`
    pub normalized_transaction_fee: u64,

    /// Writer identity (e.g. address of the funding output)
    pub writer: String,
}

/// Latest block known to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTime {
    pub time: u64,
    pub hash: String,
}

/// Result of a single ledger read
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResult {
    /// True if the ledger has more transactions after this page
    pub more_transactions: bool,

    pub transactions: Vec<Transaction>,
}

/// Funds a writer locked to buy operation quota
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueTimeLock {
    pub identifier: String,
    pub amount_locked: u64,
    pub owner: String,
    pub lock_transaction_time: u64,
    pub unlock_transaction_time: u64,
    pub normalized_fee: u64,
}

/// Read side of the ledger service
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Read transactions after the given cursor
    ///
    /// Fails with `LedgerError::InvalidCursor` if the ledger does not recognize
    /// the (number, time hash) pair, which may indicate a reorganization.
    async fn read(
        &self,
        since_transaction_number: Option<u64>,
        transaction_time_hash: Option<&str>,
    ) -> Result<ReadResult, LedgerError>;

    /// Latest block the ledger has processed
    async fn latest_time(&self) -> Result<LedgerTime, LedgerError>;

    /// First transaction in `candidates` the ledger still considers canonical
    async fn first_valid_transaction(
        &self,
        candidates: &[Transaction],
    ) -> Result<Option<Transaction>, LedgerError>;

    /// Look up a value time lock; `None` if the ledger does not know it
    async fn value_time_lock(&self, identifier: &str) -> Result<Option<ValueTimeLock>, LedgerError>;
}
