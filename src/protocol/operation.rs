//! Operation records produced by resolving a batch

use serde::{Deserialize, Serialize};

/// Operation kind
///
/// Wire format (JSON) uses lowercase: `"create"`, `"recover"`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Create,
    Recover,
    Deactivate,
    Update,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Create => "create",
            OperationType::Recover => "recover",
            OperationType::Deactivate => "deactivate",
            OperationType::Update => "update",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(OperationType::Create),
            "recover" => Ok(OperationType::Recover),
            "deactivate" => Ok(OperationType::Deactivate),
            "update" => Ok(OperationType::Update),
            other => Err(format!("unknown operation type: {}", other)),
        }
    }
}

/// One decoded operation anchored by a ledger transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredOperationModel {
    /// DID the operation applies to
    pub did_unique_suffix: String,

    pub operation_type: OperationType,

    /// UTF-8 JSON of the full operation (file references plus proof and delta)
    pub operation_buffer: Vec<u8>,

    /// Position within the batch: creates, recovers, deactivates, then updates
    pub operation_index: u64,

    pub transaction_number: u64,

    pub transaction_time: u64,
}
