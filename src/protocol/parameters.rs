//! Protocol parameters for one protocol version

use serde::{Deserialize, Serialize};

/// Limits and multipliers that govern batch validation and throughput
///
/// JSON form uses camelCase keys; omitted keys take the v1 defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtocolParameters {
    /// Maximum length of a CAS URI
    pub max_cas_uri_length: usize,

    /// Maximum compressed size of a core index file
    pub max_core_index_file_size_in_bytes: usize,

    /// Maximum compressed size of a provisional index file
    pub max_provisional_index_file_size_in_bytes: usize,

    /// Maximum compressed size of a core or provisional proof file
    pub max_proof_file_size_in_bytes: usize,

    /// Maximum compressed size of a chunk file
    pub max_chunk_file_size_in_bytes: usize,

    /// Maximum canonical size of a single delta
    pub max_delta_size_in_bytes: usize,

    /// Operations a writer may anchor without a value time lock
    pub max_number_of_operations_for_no_value_time_lock: u32,

    /// Operation quota per ledger time
    pub max_number_of_operations_per_transaction_time: u64,

    /// Transaction quota per ledger time
    pub max_number_of_transactions_per_transaction_time: usize,

    /// Upper bound on the operation count declared in an anchor string
    pub max_operations_per_batch: u32,

    /// Maximum byte length of a writer lock id
    pub max_writer_lock_id_in_bytes: usize,

    /// Per-operation fee as a fraction of the normalized fee
    pub normalized_fee_to_per_operation_fee_multiplier: f64,

    /// Lock amount needed per operation, in per-operation fees
    pub value_time_lock_amount_multiplier: u64,
}

/// Worst-case gzip expansion allowed while decompressing a batch file
pub const ESTIMATED_DECOMPRESSION_MULTIPLIER: usize = 3;

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            max_cas_uri_length: 100,
            max_core_index_file_size_in_bytes: 1_000_000,
            max_provisional_index_file_size_in_bytes: 1_000_000,
            max_proof_file_size_in_bytes: 2_500_000,
            max_chunk_file_size_in_bytes: 10_000_000,
            max_delta_size_in_bytes: 1_000,
            max_number_of_operations_for_no_value_time_lock: 100,
            max_number_of_operations_per_transaction_time: 600_000,
            max_number_of_transactions_per_transaction_time: 300,
            max_operations_per_batch: 10_000,
            max_writer_lock_id_in_bytes: 200,
            normalized_fee_to_per_operation_fee_multiplier: 0.01,
            value_time_lock_amount_multiplier: 600,
        }
    }
}
