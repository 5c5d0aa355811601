// File: src/observer/recovery.rs

use std::sync::Arc;

use crate::error::ObserverResult;
use crate::traits::{
    ConfirmationStore, LedgerClient, OperationStore, Transaction, TransactionStore,
    UnresolvableTransactionStore,
};

/// Stores touched when rolling back past a reorganization
pub(crate) struct RecoveryStores<'a> {
    pub ledger: &'a Arc<dyn LedgerClient>,
    pub operation_store: &'a Arc<dyn OperationStore>,
    pub transaction_store: &'a Arc<dyn TransactionStore>,
    pub unresolvable_store: &'a Arc<dyn UnresolvableTransactionStore>,
    pub confirmation_store: &'a Arc<dyn ConfirmationStore>,
}

/// Roll stored state back to the newest transaction the ledger still accepts
///
/// Transactions are removed last so that an interrupted recovery is re-run
/// from the same sample on the next cycle.
pub(crate) async fn revert_invalid_transactions(
    stores: RecoveryStores<'_>,
) -> ObserverResult<Option<Transaction>> {
    let samples = stores.transaction_store.exponentially_spaced_transactions().await?;
    let anchor = if samples.is_empty() {
        None
    } else {
        stores.ledger.first_valid_transaction(&samples).await?
    };

    let anchor_number = anchor.as_ref().map(|t| t.transaction_number);
    let anchor_time = anchor.as_ref().map(|t| t.transaction_time);

    tracing::info!(
        samples = samples.len(),
        transaction_number = ?anchor_number,
        transaction_time = ?anchor_time,
        "Reverting to last valid transaction"
    );

    stores.operation_store.delete(anchor_number).await?;
    stores.unresolvable_store.remove_later_than(anchor_number).await?;
    stores.confirmation_store.reset_after(anchor_time).await?;
    stores
        .transaction_store
        .remove_transactions_later_than(anchor_number)
        .await?;

    tracing::info!(transaction_number = ?anchor_number, "Reorganization recovery complete");

    Ok(anchor)
}
