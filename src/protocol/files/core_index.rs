//! Core index file: create, recover and deactivate references

use serde::{Deserialize, Serialize};

use super::{decode_file, find_duplicate, OperationReference};
use crate::protocol::encoding::{canonicalize_then_hash_then_encode, is_valid_cas_uri};
use crate::protocol::error::ProtocolError;
use crate::protocol::parameters::ProtocolParameters;

const FILE: &str = "core index";

/// Data that determines the DID of a create operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SuffixData {
    pub delta_hash: String,
    pub recovery_commitment: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub did_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateReference {
    pub suffix_data: SuffixData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreOperations {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub create: Vec<CreateReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recover: Vec<OperationReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deactivate: Vec<OperationReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CoreIndexFileModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer_lock_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisional_index_file_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_proof_file_uri: Option<String>,
    #[serde(default)]
    pub operations: CoreOperations,
}

/// A parsed and structurally validated core index file
#[derive(Debug, Clone)]
pub struct CoreIndexFile {
    pub model: CoreIndexFileModel,
    pub create_did_suffixes: Vec<String>,
    pub recover_did_suffixes: Vec<String>,
    pub deactivate_did_suffixes: Vec<String>,
}

impl CoreIndexFile {
    pub fn parse(buffer: &[u8], params: &ProtocolParameters) -> Result<Self, ProtocolError> {
        let model: CoreIndexFileModel =
            decode_file(FILE, buffer, params.max_core_index_file_size_in_bytes)?;
        Self::from_model(model, params)
    }

    pub fn from_model(
        model: CoreIndexFileModel,
        params: &ProtocolParameters,
    ) -> Result<Self, ProtocolError> {
        if let Some(lock_id) = &model.writer_lock_id {
            if lock_id.len() > params.max_writer_lock_id_in_bytes {
                return Err(ProtocolError::CoreIndexFileWriterLockIdTooLarge {
                    size: lock_id.len(),
                    max: params.max_writer_lock_id_in_bytes,
                });
            }
        }

        let ops = &model.operations;
        let create_did_suffixes: Vec<String> = ops
            .create
            .iter()
            .map(|c| suffix_of(&c.suffix_data))
            .collect::<Result<_, _>>()?;
        let recover_did_suffixes: Vec<String> =
            ops.recover.iter().map(|r| r.did_suffix.clone()).collect();
        let deactivate_did_suffixes: Vec<String> =
            ops.deactivate.iter().map(|d| d.did_suffix.clone()).collect();

        let all = create_did_suffixes
            .iter()
            .chain(&recover_did_suffixes)
            .chain(&deactivate_did_suffixes);
        if let Some(suffix) = find_duplicate(all) {
            return Err(ProtocolError::MultipleOperationsForTheSameDid {
                file: FILE,
                suffix: suffix.clone(),
            });
        }

        // A batch has at least one operation, so an empty core index file must
        // point at the provisional index file. Deactivates carry no delta, so a
        // deactivate-only batch has nothing to put there.
        let total = create_did_suffixes.len() + recover_did_suffixes.len() + deactivate_did_suffixes.len();
        let deactivate_only = total > 0 && deactivate_did_suffixes.len() == total;
        match (&model.provisional_index_file_uri, deactivate_only) {
            (Some(_), true) => return Err(ProtocolError::CoreIndexFileProvisionalIndexFileUriNotAllowed),
            (None, false) => return Err(ProtocolError::CoreIndexFileProvisionalIndexFileUriMissing),
            _ => {}
        }

        let needs_proof = !recover_did_suffixes.is_empty() || !deactivate_did_suffixes.is_empty();
        match (&model.core_proof_file_uri, needs_proof) {
            (None, true) => return Err(ProtocolError::CoreIndexFileCoreProofFileUriMissing),
            (Some(_), false) => return Err(ProtocolError::CoreIndexFileCoreProofFileUriNotAllowed),
            _ => {}
        }

        for uri in [&model.provisional_index_file_uri, &model.core_proof_file_uri]
            .into_iter()
            .flatten()
        {
            if !is_valid_cas_uri(uri, params.max_cas_uri_length) {
                return Err(ProtocolError::CasFileUriNotValid(uri.clone()));
            }
        }

        Ok(Self {
            model,
            create_did_suffixes,
            recover_did_suffixes,
            deactivate_did_suffixes,
        })
    }

    /// Suffixes in create, recover, deactivate order
    pub fn did_unique_suffixes(&self) -> impl Iterator<Item = &String> {
        self.create_did_suffixes
            .iter()
            .chain(&self.recover_did_suffixes)
            .chain(&self.deactivate_did_suffixes)
    }

    pub fn operation_count(&self) -> usize {
        self.create_did_suffixes.len() + self.recover_did_suffixes.len() + self.deactivate_did_suffixes.len()
    }
}

fn suffix_of(suffix_data: &SuffixData) -> Result<String, ProtocolError> {
    let value = serde_json::to_value(suffix_data).map_err(|e| ProtocolError::FileMalformed {
        file: FILE,
        reason: e.to_string(),
    })?;
    Ok(canonicalize_then_hash_then_encode(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::files::encode_file;

    fn create(n: u32) -> CreateReference {
        CreateReference {
            suffix_data: SuffixData {
                delta_hash: format!("delta{}", n),
                recovery_commitment: format!("commit{}", n),
                did_type: None,
                anchor_origin: None,
            },
        }
    }

    fn reference(suffix: &str) -> OperationReference {
        OperationReference {
            did_suffix: suffix.to_string(),
            reveal_value: "reveal".to_string(),
        }
    }

    fn params() -> ProtocolParameters {
        ProtocolParameters::default()
    }

    #[test]
    fn test_parse_create_only() {
        let model = CoreIndexFileModel {
            provisional_index_file_uri: Some("QmProvisional".into()),
            operations: CoreOperations {
                create: vec![create(1), create(2)],
                ..Default::default()
            },
            ..Default::default()
        };
        let buffer = encode_file(&model).unwrap();

        let file = CoreIndexFile::parse(&buffer, &params()).unwrap();
        assert_eq!(file.operation_count(), 2);
        assert_eq!(file.create_did_suffixes.len(), 2);
        assert_ne!(file.create_did_suffixes[0], file.create_did_suffixes[1]);
    }

    #[test]
    fn test_parse_rejects_unknown_property() {
        let json = serde_json::json!({
            "provisionalIndexFileUri": "QmProvisional",
            "unexpected": true
        });
        let buffer = encode_file(&json).unwrap();
        assert!(matches!(
            CoreIndexFile::parse(&buffer, &params()),
            Err(ProtocolError::FileMalformed { file: "core index", .. })
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_operation_kind() {
        let json = serde_json::json!({
            "provisionalIndexFileUri": "QmProvisional",
            "operations": { "revoke": [] }
        });
        let buffer = encode_file(&json).unwrap();
        assert!(CoreIndexFile::parse(&buffer, &params()).is_err());
    }

    #[test]
    fn test_duplicate_suffix_rejected() {
        let model = CoreIndexFileModel {
            provisional_index_file_uri: Some("QmProvisional".into()),
            core_proof_file_uri: Some("QmProof".into()),
            operations: CoreOperations {
                recover: vec![reference("did1")],
                deactivate: vec![reference("did1")],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            CoreIndexFile::from_model(model, &params()),
            Err(ProtocolError::MultipleOperationsForTheSameDid { .. })
        ));
    }

    #[test]
    fn test_empty_file_requires_provisional_index() {
        let model = CoreIndexFileModel::default();
        assert_eq!(
            CoreIndexFile::from_model(model, &params()).unwrap_err(),
            ProtocolError::CoreIndexFileProvisionalIndexFileUriMissing
        );
    }

    #[test]
    fn test_deactivate_only_forbids_provisional_index() {
        let model = CoreIndexFileModel {
            provisional_index_file_uri: Some("QmProvisional".into()),
            core_proof_file_uri: Some("QmProof".into()),
            operations: CoreOperations {
                deactivate: vec![reference("did1")],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            CoreIndexFile::from_model(model, &params()).unwrap_err(),
            ProtocolError::CoreIndexFileProvisionalIndexFileUriNotAllowed
        );
    }

    #[test]
    fn test_recover_requires_core_proof() {
        let model = CoreIndexFileModel {
            provisional_index_file_uri: Some("QmProvisional".into()),
            operations: CoreOperations {
                recover: vec![reference("did1")],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            CoreIndexFile::from_model(model, &params()).unwrap_err(),
            ProtocolError::CoreIndexFileCoreProofFileUriMissing
        );
    }

    #[test]
    fn test_create_only_forbids_core_proof() {
        let model = CoreIndexFileModel {
            provisional_index_file_uri: Some("QmProvisional".into()),
            core_proof_file_uri: Some("QmProof".into()),
            operations: CoreOperations {
                create: vec![create(1)],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            CoreIndexFile::from_model(model, &params()).unwrap_err(),
            ProtocolError::CoreIndexFileCoreProofFileUriNotAllowed
        );
    }

    #[test]
    fn test_writer_lock_id_too_large() {
        let model = CoreIndexFileModel {
            writer_lock_id: Some("x".repeat(201)),
            provisional_index_file_uri: Some("QmProvisional".into()),
            ..Default::default()
        };
        assert!(matches!(
            CoreIndexFile::from_model(model, &params()),
            Err(ProtocolError::CoreIndexFileWriterLockIdTooLarge { size: 201, max: 200 })
        ));
    }

    #[test]
    fn test_invalid_provisional_uri() {
        let model = CoreIndexFileModel {
            provisional_index_file_uri: Some("not a uri".into()),
            ..Default::default()
        };
        assert!(matches!(
            CoreIndexFile::from_model(model, &params()),
            Err(ProtocolError::CasFileUriNotValid(_))
        ));
    }

    #[test]
    fn test_suffix_ordering() {
        let model = CoreIndexFileModel {
            provisional_index_file_uri: Some("QmProvisional".into()),
            core_proof_file_uri: Some("QmProof".into()),
            operations: CoreOperations {
                create: vec![create(1)],
                recover: vec![reference("recoverDid")],
                deactivate: vec![reference("deactivateDid")],
            },
            ..Default::default()
        };
        let file = CoreIndexFile::from_model(model, &params()).unwrap();
        let suffixes: Vec<&String> = file.did_unique_suffixes().collect();
        assert_eq!(suffixes.len(), 3);
        assert_eq!(suffixes[1], "recoverDid");
        assert_eq!(suffixes[2], "deactivateDid");
    }
}
