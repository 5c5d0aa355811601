//! Protocol version table and version manager
//!
//! A version becomes active at its `startingBlockchainTime` and stays active
//! until the next version starts.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::ProtocolError;
use super::parameters::ProtocolParameters;
use super::resolver::BatchFileResolver;
use super::selector::ThroughputLimiter;
use crate::error::{ObserverError, ObserverResult};
use crate::traits::{
    CasClient, LedgerClient, OperationStore, TransactionProcessor, TransactionSelector,
    TransactionStore, VersionManager,
};

/// One entry of the versions file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolVersion {
    pub starting_blockchain_time: u64,
    #[serde(default)]
    pub parameters: ProtocolParameters,
}

/// Versions sorted by starting time
#[derive(Debug, Clone)]
pub struct ProtocolVersions {
    versions: Vec<ProtocolVersion>,
}

impl ProtocolVersions {
    pub fn new(mut versions: Vec<ProtocolVersion>) -> ObserverResult<Self> {
        if versions.is_empty() {
            return Err(ObserverError::Config(
                "at least one protocol version is required".into(),
            ));
        }

        versions.sort_by_key(|v| v.starting_blockchain_time);
        for pair in versions.windows(2) {
            if pair[0].starting_blockchain_time == pair[1].starting_blockchain_time {
                return Err(ObserverError::Config(format!(
                    "duplicate protocol version starting at {}",
                    pair[0].starting_blockchain_time
                )));
            }
        }

        Ok(Self { versions })
    }

    /// A single version active from genesis
    pub fn single(parameters: ProtocolParameters) -> Self {
        Self {
            versions: vec![ProtocolVersion {
                starting_blockchain_time: 0,
                parameters,
            }],
        }
    }

    /// Load a JSON array of versions
    pub fn from_json_file(path: impl AsRef<Path>) -> ObserverResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ObserverError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let versions: Vec<ProtocolVersion> = serde_json::from_str(&raw).map_err(|e| {
            ObserverError::Config(format!("invalid versions file {}: {}", path.display(), e))
        })?;
        Self::new(versions)
    }

    pub fn versions(&self) -> &[ProtocolVersion] {
        &self.versions
    }

    fn index_at(&self, time: u64) -> Option<usize> {
        self.versions
            .iter()
            .rposition(|v| v.starting_blockchain_time <= time)
    }

    /// Parameters of the version active at `time`
    pub fn parameters_at(&self, time: u64) -> Result<&ProtocolParameters, ProtocolError> {
        self.index_at(time)
            .map(|i| &self.versions[i].parameters)
            .ok_or(ProtocolError::UnknownProtocolVersion(time))
    }
}

struct VersionEntry {
    starting_blockchain_time: u64,
    processor: Arc<dyn TransactionProcessor>,
    selector: Arc<dyn TransactionSelector>,
}

/// Builds one resolver/limiter pair per protocol version
pub struct ProtocolVersionManager {
    entries: Vec<VersionEntry>,
}

impl ProtocolVersionManager {
    pub fn new(
        versions: Arc<ProtocolVersions>,
        ledger: Arc<dyn LedgerClient>,
        cas: Arc<dyn CasClient>,
        operation_store: Arc<dyn OperationStore>,
        transaction_store: Arc<dyn TransactionStore>,
    ) -> Self {
        let entries = versions
            .versions()
            .iter()
            .map(|version| {
                let params = Arc::new(version.parameters.clone());
                let processor = BatchFileResolver::new(
                    Arc::clone(&params),
                    Arc::clone(&versions),
                    Arc::clone(&ledger),
                    Arc::clone(&cas),
                    Arc::clone(&operation_store),
                );
                let selector = ThroughputLimiter::new(params, Arc::clone(&transaction_store));
                VersionEntry {
                    starting_blockchain_time: version.starting_blockchain_time,
                    processor: Arc::new(processor),
                    selector: Arc::new(selector),
                }
            })
            .collect();

        Self { entries }
    }

    fn entry_at(&self, time: u64) -> ObserverResult<&VersionEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.starting_blockchain_time <= time)
            .ok_or(ObserverError::VersionNotFound(time))
    }
}

impl VersionManager for ProtocolVersionManager {
    fn transaction_processor(
        &self,
        transaction_time: u64,
    ) -> ObserverResult<Arc<dyn TransactionProcessor>> {
        Ok(Arc::clone(&self.entry_at(transaction_time)?.processor))
    }

    fn transaction_selector(
        &self,
        transaction_time: u64,
    ) -> ObserverResult<Arc<dyn TransactionSelector>> {
        Ok(Arc::clone(&self.entry_at(transaction_time)?.selector))
    }
}
