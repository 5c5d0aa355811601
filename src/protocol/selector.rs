//! Throughput limiter
//!
//! Caps how many transactions and operations are admitted per ledger time.
//! Higher fees win; ties go to the earlier transaction.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use super::anchored_data::AnchoredData;
use super::error::ProtocolError;
use super::parameters::ProtocolParameters;
use crate::error::ObserverResult;
use crate::traits::{Transaction, TransactionSelector, TransactionStore};

/// Heap entry ordered by fee, then by lower transaction number
struct Candidate(Transaction);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .transaction_fee_paid
            .cmp(&other.0.transaction_fee_paid)
            .then_with(|| other.0.transaction_number.cmp(&self.0.transaction_number))
    }
}

pub struct ThroughputLimiter {
    params: Arc<ProtocolParameters>,
    transaction_store: Arc<dyn TransactionStore>,
}

impl ThroughputLimiter {
    pub fn new(params: Arc<ProtocolParameters>, transaction_store: Arc<dyn TransactionStore>) -> Self {
        Self {
            params,
            transaction_store,
        }
    }

    fn operation_count(&self, transaction: &Transaction) -> Result<u32, ProtocolError> {
        AnchoredData::deserialize(&transaction.anchor_string, self.params.max_operations_per_batch)
            .map(|data| data.number_of_operations)
    }

    /// Quotas left after the transactions already committed at `transaction_time`
    async fn remaining_quota(&self, transaction_time: u64) -> ObserverResult<(usize, u64)> {
        let committed = self
            .transaction_store
            .transactions_starting_from(transaction_time, transaction_time.saturating_add(1))
            .await?;

        let mut committed_operations = 0u64;
        for transaction in &committed {
            match self.operation_count(transaction) {
                Ok(n) => committed_operations += n as u64,
                Err(e) => tracing::warn!(
                    transaction_number = transaction.transaction_number,
                    error = %e,
                    "Committed transaction has an undecodable anchor string"
                ),
            }
        }

        Ok((
            self.params
                .max_number_of_transactions_per_transaction_time
                .saturating_sub(committed.len()),
            self.params
                .max_number_of_operations_per_transaction_time
                .saturating_sub(committed_operations),
        ))
    }
}

#[async_trait]
impl TransactionSelector for ThroughputLimiter {
    async fn select_qualified_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> ObserverResult<Vec<Transaction>> {
        let transaction_time = match transactions.first() {
            Some(first) => first.transaction_time,
            None => return Ok(Vec::new()),
        };

        if let Some(other) = transactions
            .iter()
            .find(|t| t.transaction_time != transaction_time)
        {
            return Err(ProtocolError::TransactionTimeMismatch {
                expected: transaction_time,
                actual: other.transaction_time,
            }
            .into());
        }

        let mut writers = HashSet::new();
        let mut heap = BinaryHeap::with_capacity(transactions.len());
        for transaction in transactions {
            if writers.insert(transaction.writer.clone()) {
                heap.push(Candidate(transaction));
            } else {
                tracing::info!(
                    transaction_number = transaction.transaction_number,
                    writer = %transaction.writer,
                    "Writer already has a transaction at this time, ignoring"
                );
            }
        }

        let (transaction_quota, operation_quota) = self.remaining_quota(transaction_time).await?;

        let mut selected = Vec::new();
        let mut operations = 0u64;
        while selected.len() < transaction_quota && operations < operation_quota {
            let Some(Candidate(transaction)) = heap.pop() else {
                break;
            };

            let count = match self.operation_count(&transaction) {
                Ok(n) => n as u64,
                Err(e) => {
                    tracing::info!(
                        transaction_number = transaction.transaction_number,
                        anchor_string = %transaction.anchor_string,
                        error = %e,
                        "Skipping transaction with malformed anchor string"
                    );
                    continue;
                }
            };

            if operations + count > operation_quota {
                tracing::debug!(
                    transaction_number = transaction.transaction_number,
                    operations = count,
                    remaining = operation_quota - operations,
                    "Transaction exceeds operation quota"
                );
                continue;
            }

            operations += count;
            selected.push(transaction);
        }

        selected.sort_by_key(|t| t.transaction_number);
        Ok(selected)
    }
}
