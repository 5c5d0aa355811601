//! Trait definitions for the ledger, CAS, stores and protocol versions

pub mod cas;
pub mod ledger;
pub mod store;
pub mod versioning;

// Re-export all types
pub use cas::CasClient;
pub use ledger::{LedgerClient, LedgerTime, ReadResult, Transaction, ValueTimeLock};
pub use store::{
    ConfirmationRecord, ConfirmationStore, OperationStore, TransactionStore,
    UnresolvableTransactionStore,
};
pub use versioning::{TransactionProcessor, TransactionSelector, VersionManager};
