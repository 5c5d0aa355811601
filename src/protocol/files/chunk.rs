//! Chunk file: one delta per create, recover and update operation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decode_file;
use crate::protocol::encoding::canonicalize;
use crate::protocol::error::ProtocolError;
use crate::protocol::parameters::ProtocolParameters;

const FILE: &str = "chunk";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChunkFileModel {
    pub deltas: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct ChunkFile {
    pub model: ChunkFileModel,
}

impl ChunkFile {
    pub fn parse(buffer: &[u8], params: &ProtocolParameters) -> Result<Self, ProtocolError> {
        let model: ChunkFileModel = decode_file(FILE, buffer, params.max_chunk_file_size_in_bytes)?;

        for delta in &model.deltas {
            if !delta.is_object() {
                return Err(ProtocolError::FileMalformed {
                    file: FILE,
                    reason: "delta is not a JSON object".into(),
                });
            }
            let size = canonicalize(delta).len();
            if size > params.max_delta_size_in_bytes {
                return Err(ProtocolError::ChunkFileDeltaSizeExceedsLimit {
                    size,
                    max: params.max_delta_size_in_bytes,
                });
            }
        }

        Ok(Self { model })
    }

    pub fn deltas(&self) -> &[Value] {
        &self.model.deltas
    }
}
