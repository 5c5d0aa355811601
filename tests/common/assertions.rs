//! Custom test assertions over observer state

use sidetree_observer::protocol::OperationType;
use sidetree_observer::{OperationStore, SqliteStore, TransactionStore};

/// Assert the transaction store holds exactly these numbers, in order
pub async fn assert_committed(store: &SqliteStore, expected: &[u64]) {
    let committed: Vec<u64> = store
        .transactions()
        .await
        .expect("Failed to list transactions")
        .iter()
        .map(|t| t.transaction_number)
        .collect();
    assert_eq!(committed, expected, "Committed transactions differ");
}

/// Assert a DID has a single create anchored by `transaction_number`
pub async fn assert_created_in(store: &SqliteStore, did_suffix: &str, transaction_number: u64) {
    let operations = OperationStore::get(store, did_suffix)
        .await
        .expect("Failed to read operations");
    assert_eq!(operations.len(), 1, "Expected one operation for {}", did_suffix);
    assert_eq!(operations[0].operation_type, OperationType::Create);
    assert_eq!(operations[0].transaction_number, transaction_number);
}

/// Assert nothing is stored for a DID
pub async fn assert_no_operations(store: &SqliteStore, did_suffix: &str) {
    let operations = OperationStore::get(store, did_suffix)
        .await
        .expect("Failed to read operations");
    assert!(
        operations.is_empty(),
        "Expected no operations for {}, found {}",
        did_suffix,
        operations.len()
    );
}
