//! Protocol rule violations raised while decoding and validating batches

use thiserror::Error;

/// Batch decoding and validation errors
///
/// Every variant except the CAS availability ones describes content that will
/// never become valid, so the batch (or the failing stage of it) is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    // ========== Anchor String ==========
    #[error("anchor string has incorrect format: {0}")]
    AnchoredDataIncorrectFormat(String),

    #[error("number of operations is not a positive integer: {0}")]
    AnchoredDataNumberOfOperationsNotPositiveInteger(String),

    #[error("number of operations has a leading zero: {0}")]
    AnchoredDataNumberOfOperationsHasLeadingZero(String),

    #[error("number of operations {count} exceeds maximum {max}")]
    AnchoredDataNumberOfOperationsGreaterThanMax { count: String, max: u32 },

    // ========== Fee ==========
    #[error("operation count must be greater than zero")]
    OperationCountNotPositive,

    #[error("transaction fee paid {paid} is less than required fee {required}")]
    TransactionFeePaidInvalid { paid: u64, required: u64 },

    // ========== Transaction Selection ==========
    #[error("transactions with different ledger times in one selection: expected {expected}, got {actual}")]
    TransactionTimeMismatch { expected: u64, actual: u64 },

    // ========== CAS ==========
    #[error("CAS file URI is not valid: {0}")]
    CasFileUriNotValid(String),

    #[error("CAS file {uri} exceeds maximum size of {max} bytes")]
    CasFileTooLarge { uri: String, max: usize },

    #[error("CAS URI {0} is not a file")]
    CasFileNotAFile(String),

    #[error("CAS not reachable while fetching {0}")]
    CasNotReachable(String),

    #[error("CAS file not found: {0}")]
    CasFileNotFound(String),

    // ========== File Structure ==========
    #[error("{file} file decompression failure: {reason}")]
    FileDecompressionFailure { file: &'static str, reason: String },

    #[error("{file} file is not JSON: {reason}")]
    FileNotJson { file: &'static str, reason: String },

    #[error("{file} file is malformed: {reason}")]
    FileMalformed { file: &'static str, reason: String },

    #[error("{file} file references DID suffix {suffix} more than once")]
    MultipleOperationsForTheSameDid { file: &'static str, suffix: String },

    #[error("signed data is malformed: {0}")]
    SignedDataMalformed(String),

    // ========== Core Index File ==========
    #[error("core index file has {count} operations but only {paid} were paid for")]
    CoreIndexFileOperationCountExceededPaidLimit { count: usize, paid: u32 },

    #[error("writer lock id of {size} bytes exceeds maximum {max}")]
    CoreIndexFileWriterLockIdTooLarge { size: usize, max: usize },

    #[error("core index file is missing the provisional index file URI")]
    CoreIndexFileProvisionalIndexFileUriMissing,

    #[error("core index file with only deactivates must not reference a provisional index file")]
    CoreIndexFileProvisionalIndexFileUriNotAllowed,

    #[error("core index file is missing the core proof file URI")]
    CoreIndexFileCoreProofFileUriMissing,

    #[error("core index file without recover or deactivate must not reference a core proof file")]
    CoreIndexFileCoreProofFileUriNotAllowed,

    // ========== Proof Files ==========
    #[error("{file} file has {actual} proofs, expected {expected}")]
    ProofCountMismatch {
        file: &'static str,
        expected: usize,
        actual: usize,
    },

    // ========== Provisional Index File ==========
    #[error("provisional index file has {count} updates, max paid is {max}")]
    ProvisionalIndexFileUpdateCountExceededPaidLimit { count: usize, max: usize },

    #[error("provisional index file must reference exactly one chunk, found {0}")]
    ProvisionalIndexFileChunkCountIncorrect(usize),

    #[error("provisional index file is missing the provisional proof file URI")]
    ProvisionalIndexFileProvisionalProofFileUriMissing,

    #[error("provisional index file without updates must not reference a provisional proof file")]
    ProvisionalIndexFileProvisionalProofFileUriNotAllowed,

    // ========== Chunk File ==========
    #[error("chunk file has {actual} deltas, expected {expected}")]
    ChunkFileDeltaCountIncorrect { expected: usize, actual: usize },

    #[error("delta of {size} bytes exceeds maximum {max}")]
    ChunkFileDeltaSizeExceedsLimit { size: usize, max: usize },

    // ========== Value Time Lock ==========
    #[error("{operations} operations require a value time lock (free limit {max_free})")]
    ValueTimeLockRequired { operations: u32, max_free: u32 },

    #[error("transaction time {time} outside lock range [{lock_time}, {unlock_time})")]
    ValueTimeLockTransactionTimeOutsideLockRange {
        time: u64,
        lock_time: u64,
        unlock_time: u64,
    },

    #[error("lock owner {owner} does not match transaction writer {writer}")]
    ValueTimeLockOwnerMismatch { owner: String, writer: String },

    #[error("lock allows {allowed} operations, {requested} requested")]
    ValueTimeLockInsufficientAmount { allowed: u64, requested: u32 },

    #[error("no protocol version defined for ledger time {0}")]
    UnknownProtocolVersion(u64),
}

impl ProtocolError {
    /// True for CAS availability failures that justify fetching again later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProtocolError::CasNotReachable(_) | ProtocolError::CasFileNotFound(_)
        )
    }

    /// Classify a serde_json failure as syntax vs. shape
    pub(crate) fn from_json(file: &'static str, e: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match e.classify() {
            Category::Syntax | Category::Eof | Category::Io => ProtocolError::FileNotJson {
                file,
                reason: e.to_string(),
            },
            Category::Data => ProtocolError::FileMalformed {
                file,
                reason: e.to_string(),
            },
        }
    }
}
