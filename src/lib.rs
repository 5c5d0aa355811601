//! sidetree-observer library exports

pub mod clients;
pub mod config;
pub mod error;
pub mod observer;
pub mod protocol;
pub mod storage;
pub mod traits;

// Re-exports
pub use error::{ObserverError, ObserverResult, StorageError};
pub use observer::{Observer, ObserverConfig};
pub use protocol::{
    BatchFileResolver, ProtocolParameters, ProtocolVersionManager, ProtocolVersions,
    ThroughputLimiter,
};
pub use traits::{
    CasClient, ConfirmationStore, LedgerClient, OperationStore, Transaction, TransactionStore,
    UnresolvableTransactionStore, VersionManager,
};

#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;
