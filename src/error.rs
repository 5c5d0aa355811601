//! Observer error types

use thiserror::Error;

pub use crate::clients::error::{FetchError, LedgerError};
pub use crate::protocol::error::ProtocolError;

/// Main observer error type
#[derive(Debug, Error)]
pub enum ObserverError {
    // ========== Collaborator Errors ==========
    /// Store operation failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Ledger client failed
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// CAS read failed
    #[error("CAS error: {0}")]
    Cas(#[from] FetchError),

    // ========== Protocol Errors ==========
    /// Batch content or anchoring rule violated
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// No protocol version is active at the given ledger time
    #[error("no protocol version defined for ledger time {0}")]
    VersionNotFound(u64),

    // ========== Server Errors ==========
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Stored data could not be decoded
    #[error("data corruption: {0}")]
    Corruption(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite database error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(String),
}

/// Observer result type alias
pub type ObserverResult<T> = Result<T, ObserverError>;

impl ObserverError {
    /// Check if error is transient (retrying later may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            ObserverError::Ledger(LedgerError::InvalidCursor { .. }) => false,
            ObserverError::Ledger(_) => true,
            ObserverError::Cas(e) => matches!(e, FetchError::NotFound | FetchError::Unreachable(_)),
            ObserverError::Storage(StorageError::ConnectionFailed(_)) => true,
            ObserverError::Protocol(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ObserverError {
    fn from(e: serde_json::Error) -> Self {
        ObserverError::Internal(format!("json: {}", e))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for ObserverError {
    fn from(e: rusqlite::Error) -> Self {
        ObserverError::Storage(StorageError::Sqlite(e))
    }
}
