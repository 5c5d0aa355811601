// File: src/observer/processing.rs

//! Resolution of a single transaction and its in-window bookkeeping

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::traits::{ConfirmationStore, Transaction, UnresolvableTransactionStore, VersionManager};

/// Final state of a transaction in the observer window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    Processing,
    Processed,
    /// Bookkeeping failed; the transaction must not be committed
    Error,
}

/// A transaction dispatched for resolution
#[derive(Debug)]
pub struct TransactionUnderProcessing {
    pub transaction: Transaction,
    pub status: ProcessingStatus,
    handle: Option<JoinHandle<ProcessingStatus>>,
}

impl TransactionUnderProcessing {
    pub(crate) fn spawn(transaction: Transaction, context: ProcessingContext) -> Self {
        let handle = tokio::spawn(context.process(transaction.clone()));
        Self {
            transaction,
            status: ProcessingStatus::Processing,
            handle: Some(handle),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.handle.is_some()
    }

    /// Pick up the result if the task already finished
    pub(crate) async fn refresh(&mut self) {
        if self.handle.as_ref().is_some_and(|h| h.is_finished()) {
            self.settle().await;
        }
    }

    /// Wait for the task and record its status
    pub(crate) async fn settle(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.status = match handle.await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(
                    transaction_number = self.transaction.transaction_number,
                    error = %e,
                    "Transaction processing task failed"
                );
                ProcessingStatus::Error
            }
        };
    }
}

/// Collaborators shared by every processing task
#[derive(Clone)]
pub(crate) struct ProcessingContext {
    pub versions: Arc<dyn VersionManager>,
    pub unresolvable_store: Arc<dyn UnresolvableTransactionStore>,
    pub confirmation_store: Arc<dyn ConfirmationStore>,
}

impl ProcessingContext {
    /// Resolve one transaction and update retry bookkeeping
    pub(crate) async fn process(self, transaction: Transaction) -> ProcessingStatus {
        let fully_processed = self.resolve(&transaction).await;

        if let Err(e) = self
            .confirmation_store
            .confirm(&transaction.anchor_string, transaction.transaction_time)
            .await
        {
            tracing::warn!(
                transaction_number = transaction.transaction_number,
                anchor_string = %transaction.anchor_string,
                error = %e,
                "Failed to record anchor confirmation"
            );
        }

        if fully_processed {
            if let Err(e) = self.unresolvable_store.remove(&transaction).await {
                tracing::warn!(
                    transaction_number = transaction.transaction_number,
                    error = %e,
                    "Failed to clear retry record"
                );
            }
            return ProcessingStatus::Processed;
        }

        match self.unresolvable_store.record_fetch_attempt(&transaction).await {
            Ok(()) => ProcessingStatus::Processed,
            Err(e) => {
                tracing::error!(
                    transaction_number = transaction.transaction_number,
                    transaction_time = transaction.transaction_time,
                    error = %e,
                    "Failed to record fetch attempt"
                );
                ProcessingStatus::Error
            }
        }
    }

    async fn resolve(&self, transaction: &Transaction) -> bool {
        let processor = match self.versions.transaction_processor(transaction.transaction_time) {
            Ok(processor) => processor,
            Err(e) => {
                tracing::warn!(
                    transaction_number = transaction.transaction_number,
                    transaction_time = transaction.transaction_time,
                    error = %e,
                    "No transaction processor for transaction"
                );
                return false;
            }
        };

        match processor.process_transaction(transaction).await {
            Ok(done) => done,
            Err(e) => {
                tracing::warn!(
                    transaction_number = transaction.transaction_number,
                    anchor_string = %transaction.anchor_string,
                    error = %e,
                    "Transaction processing failed"
                );
                false
            }
        }
    }
}
