//! Ledger and CAS client error types

use thiserror::Error;

/// Ledger client errors
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The (transaction number, time hash) cursor is not known to the ledger
    #[error("invalid transaction number or time hash: since={since:?} hash={time_hash:?}")]
    InvalidCursor {
        since: Option<u64>,
        time_hash: Option<String>,
    },

    /// Network communication error
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout
    #[error("timeout after {0} seconds")]
    Timeout(u64),

    /// Service returned an error status
    #[error("service error: {0}")]
    ServiceError(String),

    /// Invalid response from service
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl LedgerError {
    /// True if the ledger rejected the read cursor
    pub fn is_invalid_cursor(&self) -> bool {
        matches!(self, LedgerError::InvalidCursor { .. })
    }
}

/// Outcome of a failed CAS read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Content not found (or fetch timed out)
    #[error("content not found")]
    NotFound,

    /// The URI is not a valid content hash
    #[error("invalid content hash")]
    InvalidHash,

    /// Content exceeds the maximum allowed size
    #[error("content exceeds maximum size of {0} bytes")]
    MaxSizeExceeded(usize),

    /// The URI points to something other than a file
    #[error("content is not a file")]
    NotAFile,

    /// CAS service could not be reached
    #[error("CAS not reachable: {0}")]
    Unreachable(String),
}
