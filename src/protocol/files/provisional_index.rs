//! Provisional index file: update references and the chunk file pointer

use serde::{Deserialize, Serialize};

use super::{decode_file, find_duplicate, OperationReference};
use crate::protocol::encoding::is_valid_cas_uri;
use crate::protocol::error::ProtocolError;
use crate::protocol::parameters::ProtocolParameters;

const FILE: &str = "provisional index";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChunkReference {
    pub chunk_file_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionalOperations {
    #[serde(default)]
    pub update: Vec<OperationReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProvisionalIndexFileModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisional_proof_file_uri: Option<String>,
    pub chunks: Vec<ChunkReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<ProvisionalOperations>,
}

#[derive(Debug, Clone)]
pub struct ProvisionalIndexFile {
    pub model: ProvisionalIndexFileModel,
    pub update_did_suffixes: Vec<String>,
}

impl ProvisionalIndexFile {
    pub fn parse(buffer: &[u8], params: &ProtocolParameters) -> Result<Self, ProtocolError> {
        let model: ProvisionalIndexFileModel =
            decode_file(FILE, buffer, params.max_provisional_index_file_size_in_bytes)?;
        Self::from_model(model, params)
    }

    pub fn from_model(
        model: ProvisionalIndexFileModel,
        params: &ProtocolParameters,
    ) -> Result<Self, ProtocolError> {
        if model.chunks.len() != 1 {
            return Err(ProtocolError::ProvisionalIndexFileChunkCountIncorrect(model.chunks.len()));
        }
        let chunk_uri = &model.chunks[0].chunk_file_uri;
        if !is_valid_cas_uri(chunk_uri, params.max_cas_uri_length) {
            return Err(ProtocolError::CasFileUriNotValid(chunk_uri.clone()));
        }

        let update_did_suffixes: Vec<String> = model
            .operations
            .iter()
            .flat_map(|ops| ops.update.iter().map(|u| u.did_suffix.clone()))
            .collect();

        if let Some(suffix) = find_duplicate(&update_did_suffixes) {
            return Err(ProtocolError::MultipleOperationsForTheSameDid {
                file: FILE,
                suffix: suffix.clone(),
            });
        }

        match (&model.provisional_proof_file_uri, update_did_suffixes.is_empty()) {
            (None, false) => {
                return Err(ProtocolError::ProvisionalIndexFileProvisionalProofFileUriMissing)
            }
            (Some(_), true) => {
                return Err(ProtocolError::ProvisionalIndexFileProvisionalProofFileUriNotAllowed)
            }
            (Some(uri), false) if !is_valid_cas_uri(uri, params.max_cas_uri_length) => {
                return Err(ProtocolError::CasFileUriNotValid(uri.clone()))
            }
            _ => {}
        }

        Ok(Self {
            model,
            update_did_suffixes,
        })
    }

    pub fn chunk_file_uri(&self) -> &str {
        &self.model.chunks[0].chunk_file_uri
    }

    pub fn update_references(&self) -> &[OperationReference] {
        self.model
            .operations
            .as_ref()
            .map(|ops| ops.update.as_slice())
            .unwrap_or(&[])
    }

    /// Drop every update along with the proof file that authorizes them
    pub fn remove_all_update_operation_references(&mut self) {
        self.model.operations = None;
        self.model.provisional_proof_file_uri = None;
        self.update_did_suffixes.clear();
    }
}
