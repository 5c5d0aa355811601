//! Batch files referenced by an anchor string
//!
//! Every file is gzip-compressed JSON. Decompression is capped at
//! `max_file_size * ESTIMATED_DECOMPRESSION_MULTIPLIER` and unknown JSON
//! properties are rejected.

pub mod chunk;
pub mod core_index;
pub mod core_proof;
pub mod provisional_index;
pub mod provisional_proof;

pub use chunk::{ChunkFile, ChunkFileModel};
pub use core_index::{CoreIndexFile, CoreIndexFileModel, CoreOperations, CreateReference, SuffixData};
pub use core_proof::{CoreProofFile, CoreProofFileModel, CoreProofOperations};
pub use provisional_index::{
    ChunkReference, ProvisionalIndexFile, ProvisionalIndexFileModel, ProvisionalOperations,
};
pub use provisional_proof::{ProvisionalProofFile, ProvisionalProofFileModel, ProvisionalProofOperations};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::compressor;
use super::encoding::decode_base64url;
use super::error::ProtocolError;
use super::parameters::ESTIMATED_DECOMPRESSION_MULTIPLIER;

/// Reference to an existing DID (recover, deactivate, update)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OperationReference {
    pub did_suffix: String,
    pub reveal_value: String,
}

/// Proof entry of a proof file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignedDataReference {
    /// Compact JWS
    pub signed_data: String,
}

/// Decompress and parse one batch file
pub(crate) fn decode_file<T: DeserializeOwned>(
    file: &'static str,
    buffer: &[u8],
    max_file_size: usize,
) -> Result<T, ProtocolError> {
    let max_decompressed = max_file_size.saturating_mul(ESTIMATED_DECOMPRESSION_MULTIPLIER);
    let json = compressor::decompress(buffer, max_decompressed).map_err(|e| {
        ProtocolError::FileDecompressionFailure {
            file,
            reason: e.to_string(),
        }
    })?;

    serde_json::from_slice(&json).map_err(|e| ProtocolError::from_json(file, e))
}

/// Serialize and compress a file model
pub fn encode_file<T: Serialize>(model: &T) -> std::io::Result<Vec<u8>> {
    let json = serde_json::to_vec(model)?;
    compressor::compress(&json)
}

/// Check that `signed_data` is a compact JWS with JSON header and payload
pub(crate) fn validate_signed_data(signed_data: &str) -> Result<serde_json::Value, ProtocolError> {
    let malformed = |reason: &str| ProtocolError::SignedDataMalformed(reason.to_string());

    let parts: Vec<&str> = signed_data.split('.').collect();
    if parts.len() != 3 {
        return Err(malformed("compact JWS must have three segments"));
    }

    let header = decode_base64url(parts[0]).ok_or_else(|| malformed("header is not base64url"))?;
    let header: serde_json::Value =
        serde_json::from_slice(&header).map_err(|_| malformed("header is not JSON"))?;
    if !header.is_object() {
        return Err(malformed("header is not a JSON object"));
    }

    let payload =
        decode_base64url(parts[1]).ok_or_else(|| malformed("payload is not base64url"))?;
    let payload: serde_json::Value =
        serde_json::from_slice(&payload).map_err(|_| malformed("payload is not JSON"))?;
    if !payload.is_object() {
        return Err(malformed("payload is not a JSON object"));
    }

    if parts[2].is_empty() || decode_base64url(parts[2]).is_none() {
        return Err(malformed("signature is not base64url"));
    }

    Ok(payload)
}

/// First duplicated value, if any
pub(crate) fn find_duplicate<'a>(values: impl IntoIterator<Item = &'a String>) -> Option<&'a String> {
    let mut seen = std::collections::HashSet::new();
    values.into_iter().find(|v| !seen.insert(v.as_str()))
}
