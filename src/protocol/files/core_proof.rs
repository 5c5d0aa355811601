//! Core proof file: signed data for recover and deactivate operations

use serde::{Deserialize, Serialize};

use super::{decode_file, validate_signed_data, SignedDataReference};
use crate::protocol::error::ProtocolError;
use crate::protocol::parameters::ProtocolParameters;

const FILE: &str = "core proof";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreProofOperations {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recover: Vec<SignedDataReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deactivate: Vec<SignedDataReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreProofFileModel {
    pub operations: CoreProofOperations,
}

#[derive(Debug, Clone)]
pub struct CoreProofFile {
    pub model: CoreProofFileModel,
}

impl CoreProofFile {
    /// Parse and check that the proof counts match the core index file
    pub fn parse(
        buffer: &[u8],
        params: &ProtocolParameters,
        expected_recover: usize,
        expected_deactivate: usize,
    ) -> Result<Self, ProtocolError> {
        let model: CoreProofFileModel = decode_file(FILE, buffer, params.max_proof_file_size_in_bytes)?;

        let ops = &model.operations;
        if ops.recover.is_empty() && ops.deactivate.is_empty() {
            return Err(ProtocolError::FileMalformed {
                file: FILE,
                reason: "no proofs".into(),
            });
        }
        check_count(expected_recover, ops.recover.len())?;
        check_count(expected_deactivate, ops.deactivate.len())?;

        for proof in ops.recover.iter().chain(&ops.deactivate) {
            validate_signed_data(&proof.signed_data)?;
        }

        Ok(Self { model })
    }

    pub fn recover_proofs(&self) -> &[SignedDataReference] {
        &self.model.operations.recover
    }

    pub fn deactivate_proofs(&self) -> &[SignedDataReference] {
        &self.model.operations.deactivate
    }
}

fn check_count(expected: usize, actual: usize) -> Result<(), ProtocolError> {
    if expected != actual {
        return Err(ProtocolError::ProofCountMismatch {
            file: FILE,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::files::encode_file;
    use crate::protocol::files::test_support::signed_data;
    use serde_json::json;

    fn proof() -> SignedDataReference {
        SignedDataReference {
            signed_data: signed_data(json!({"didSuffix": "abc"})),
        }
    }

    fn buffer(recover: usize, deactivate: usize) -> Vec<u8> {
        encode_file(&CoreProofFileModel {
            operations: CoreProofOperations {
                recover: (0..recover).map(|_| proof()).collect(),
                deactivate: (0..deactivate).map(|_| proof()).collect(),
            },
        })
        .unwrap()
    }

    #[test]
    fn test_parse_matching_counts() {
        let file = CoreProofFile::parse(&buffer(2, 1), &ProtocolParameters::default(), 2, 1).unwrap();
        assert_eq!(file.recover_proofs().len(), 2);
        assert_eq!(file.deactivate_proofs().len(), 1);
    }

    #[test]
    fn test_count_mismatch() {
        let result = CoreProofFile::parse(&buffer(1, 1), &ProtocolParameters::default(), 2, 0);
        assert_eq!(
            result.unwrap_err(),
            ProtocolError::ProofCountMismatch {
                file: "core proof",
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_malformed_signed_data() {
        let model = CoreProofFileModel {
            operations: CoreProofOperations {
                recover: vec![SignedDataReference {
                    signed_data: "not-a-jws".into(),
                }],
                deactivate: vec![],
            },
        };
        let buffer = encode_file(&model).unwrap();
        assert!(matches!(
            CoreProofFile::parse(&buffer, &ProtocolParameters::default(), 1, 0),
            Err(ProtocolError::SignedDataMalformed(_))
        ));
    }

    #[test]
    fn test_empty_proof_file_rejected() {
        assert!(matches!(
            CoreProofFile::parse(&buffer(0, 0), &ProtocolParameters::default(), 0, 0),
            Err(ProtocolError::FileMalformed { .. })
        ));
    }
}
