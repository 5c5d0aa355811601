//! Provisional proof file: signed data for update operations

use serde::{Deserialize, Serialize};

use super::{decode_file, validate_signed_data, SignedDataReference};
use crate::protocol::error::ProtocolError;
use crate::protocol::parameters::ProtocolParameters;

const FILE: &str = "provisional proof";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionalProofOperations {
    pub update: Vec<SignedDataReference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisionalProofFileModel {
    pub operations: ProvisionalProofOperations,
}

#[derive(Debug, Clone)]
pub struct ProvisionalProofFile {
    pub model: ProvisionalProofFileModel,
}

impl ProvisionalProofFile {
    pub fn parse(
        buffer: &[u8],
        params: &ProtocolParameters,
        expected_update: usize,
    ) -> Result<Self, ProtocolError> {
        let model: ProvisionalProofFileModel =
            decode_file(FILE, buffer, params.max_proof_file_size_in_bytes)?;

        let actual = model.operations.update.len();
        if actual != expected_update {
            return Err(ProtocolError::ProofCountMismatch {
                file: FILE,
                expected: expected_update,
                actual,
            });
        }

        for proof in &model.operations.update {
            validate_signed_data(&proof.signed_data)?;
        }

        Ok(Self { model })
    }

    pub fn update_proofs(&self) -> &[SignedDataReference] {
        &self.model.operations.update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::files::encode_file;
    use crate::protocol::files::test_support::signed_data;
    use serde_json::json;

    #[test]
    fn test_parse() {
        let model = ProvisionalProofFileModel {
            operations: ProvisionalProofOperations {
                update: vec![SignedDataReference {
                    signed_data: signed_data(json!({"deltaHash": "x"})),
                }],
            },
        };
        let buffer = encode_file(&model).unwrap();
        let file = ProvisionalProofFile::parse(&buffer, &ProtocolParameters::default(), 1).unwrap();
        assert_eq!(file.update_proofs().len(), 1);
    }

    #[test]
    fn test_missing_update_property() {
        let buffer = encode_file(&json!({"operations": {}})).unwrap();
        assert!(matches!(
            ProvisionalProofFile::parse(&buffer, &ProtocolParameters::default(), 0),
            Err(ProtocolError::FileMalformed { .. })
        ));
    }

    #[test]
    fn test_count_mismatch() {
        let buffer = encode_file(&ProvisionalProofFileModel::default()).unwrap();
        assert!(matches!(
            ProvisionalProofFile::parse(&buffer, &ProtocolParameters::default(), 2),
            Err(ProtocolError::ProofCountMismatch { expected: 2, actual: 0, .. })
        ));
    }
}
