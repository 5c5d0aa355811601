// File: src/protocol/resolver.rs

//! Batch file resolver
//!
//! Downloads the file set an anchor string points at, validates each file
//! against the ones before it, and stores the decoded operations.
//!
//! Resolution runs in two stages:
//! 1. Core: anchor string, fee, core index file, value time lock, core proof file
//! 2. Provisional: provisional index file, provisional proof file, chunk file
//!
//! A permanent failure in the core stage drops the whole batch. A permanent
//! failure in the provisional stage keeps the core operations (without deltas).
//! Any retryable failure stores nothing so the next attempt starts clean.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::anchored_data::AnchoredData;
use super::encoding::is_valid_cas_uri;
use super::error::ProtocolError;
use super::fee::verify_transaction_fee;
use super::files::{
    ChunkFile, CoreIndexFile, CoreProofFile, ProvisionalIndexFile, ProvisionalProofFile,
};
use super::operation::{AnchoredOperationModel, OperationType};
use super::parameters::ProtocolParameters;
use super::value_time_lock::verify_lock_amount;
use super::versions::ProtocolVersions;
use crate::error::{FetchError, ObserverError, ObserverResult};
use crate::traits::{CasClient, LedgerClient, OperationStore, Transaction, TransactionProcessor};

/// Files of the core stage
struct CoreFiles {
    anchored_data: AnchoredData,
    index: CoreIndexFile,
    proof: Option<CoreProofFile>,
}

/// Files of the provisional stage
struct ProvisionalFiles {
    index: ProvisionalIndexFile,
    proof: Option<ProvisionalProofFile>,
    chunk: ChunkFile,
}

/// Resolves anchored transactions for one protocol version
pub struct BatchFileResolver {
    params: Arc<ProtocolParameters>,
    versions: Arc<ProtocolVersions>,
    ledger: Arc<dyn LedgerClient>,
    cas: Arc<dyn CasClient>,
    operation_store: Arc<dyn OperationStore>,
}

impl BatchFileResolver {
    pub fn new(
        params: Arc<ProtocolParameters>,
        versions: Arc<ProtocolVersions>,
        ledger: Arc<dyn LedgerClient>,
        cas: Arc<dyn CasClient>,
        operation_store: Arc<dyn OperationStore>,
    ) -> Self {
        Self {
            params,
            versions,
            ledger,
            cas,
            operation_store,
        }
    }

    async fn download_core_files(&self, transaction: &Transaction) -> ObserverResult<CoreFiles> {
        let params = &*self.params;
        let anchored_data =
            AnchoredData::deserialize(&transaction.anchor_string, params.max_operations_per_batch)?;
        let paid = anchored_data.number_of_operations;

        verify_transaction_fee(
            transaction.transaction_fee_paid,
            paid,
            transaction.normalized_transaction_fee,
            params,
        )?;

        let buffer = self
            .fetch(&anchored_data.core_index_file_uri, params.max_core_index_file_size_in_bytes)
            .await?;
        let index = CoreIndexFile::parse(&buffer, params)?;

        let count = index.operation_count();
        if count > paid as usize {
            return Err(ProtocolError::CoreIndexFileOperationCountExceededPaidLimit { count, paid }.into());
        }

        let lock = match &index.model.writer_lock_id {
            Some(id) => self.ledger.value_time_lock(id).await?,
            None => None,
        };
        verify_lock_amount(
            lock.as_ref(),
            paid,
            transaction.transaction_time,
            &transaction.writer,
            params,
            &self.versions,
        )?;

        let proof = match &index.model.core_proof_file_uri {
            Some(uri) => {
                let buffer = self.fetch(uri, params.max_proof_file_size_in_bytes).await?;
                Some(CoreProofFile::parse(
                    &buffer,
                    params,
                    index.recover_did_suffixes.len(),
                    index.deactivate_did_suffixes.len(),
                )?)
            }
            None => None,
        };

        Ok(CoreFiles {
            anchored_data,
            index,
            proof,
        })
    }

    async fn download_provisional_files(
        &self,
        transaction: &Transaction,
        core: &CoreFiles,
    ) -> ObserverResult<Option<ProvisionalFiles>> {
        let params = &*self.params;
        let uri = match &core.index.model.provisional_index_file_uri {
            Some(uri) => uri,
            None => return Ok(None),
        };

        let buffer = self
            .fetch(uri, params.max_provisional_index_file_size_in_bytes)
            .await?;
        let mut index = ProvisionalIndexFile::parse(&buffer, params)?;

        let max_updates = (core.anchored_data.number_of_operations as usize)
            .saturating_sub(core.index.operation_count());
        let updates = index.update_did_suffixes.len();
        if updates > max_updates {
            return Err(ProtocolError::ProvisionalIndexFileUpdateCountExceededPaidLimit {
                count: updates,
                max: max_updates,
            }
            .into());
        }

        let core_suffixes: HashSet<&String> = core.index.did_unique_suffixes().collect();
        if index.update_did_suffixes.iter().any(|s| core_suffixes.contains(s)) {
            tracing::warn!(
                transaction_number = transaction.transaction_number,
                "Update references a DID already in the core index file, dropping all updates"
            );
            index.remove_all_update_operation_references();
        }

        let proof = match &index.model.provisional_proof_file_uri {
            Some(uri) => {
                let buffer = self.fetch(uri, params.max_proof_file_size_in_bytes).await?;
                Some(ProvisionalProofFile::parse(
                    &buffer,
                    params,
                    index.update_did_suffixes.len(),
                )?)
            }
            None => None,
        };

        let buffer = self
            .fetch(index.chunk_file_uri(), params.max_chunk_file_size_in_bytes)
            .await?;
        let chunk = ChunkFile::parse(&buffer, params)?;

        let expected = core.index.create_did_suffixes.len()
            + core.index.recover_did_suffixes.len()
            + index.update_did_suffixes.len();
        if chunk.deltas().len() != expected {
            return Err(ProtocolError::ChunkFileDeltaCountIncorrect {
                expected,
                actual: chunk.deltas().len(),
            }
            .into());
        }

        Ok(Some(ProvisionalFiles { index, proof, chunk }))
    }

    /// Fetch a batch file, translating CAS outcomes into protocol errors
    async fn fetch(&self, uri: &str, max_size: usize) -> Result<Vec<u8>, ProtocolError> {
        if !is_valid_cas_uri(uri, self.params.max_cas_uri_length) {
            return Err(ProtocolError::CasFileUriNotValid(uri.to_string()));
        }

        self.cas.read(uri, max_size).await.map_err(|e| match e {
            FetchError::NotFound => ProtocolError::CasFileNotFound(uri.to_string()),
            FetchError::Unreachable(_) => ProtocolError::CasNotReachable(uri.to_string()),
            FetchError::InvalidHash => ProtocolError::CasFileUriNotValid(uri.to_string()),
            FetchError::MaxSizeExceeded(max) => ProtocolError::CasFileTooLarge {
                uri: uri.to_string(),
                max,
            },
            FetchError::NotAFile => ProtocolError::CasFileNotAFile(uri.to_string()),
        })
    }
}

#[async_trait]
impl TransactionProcessor for BatchFileResolver {
    async fn process_transaction(&self, transaction: &Transaction) -> ObserverResult<bool> {
        let core = match self.download_core_files(transaction).await {
            Ok(core) => core,
            Err(e) => return Ok(classify_failure(transaction, "core", &e)),
        };

        let provisional = match self.download_provisional_files(transaction, &core).await {
            Ok(provisional) => provisional,
            Err(e) => {
                if !classify_failure(transaction, "provisional", &e) {
                    return Ok(false);
                }
                None
            }
        };

        let operations = compose_operations(transaction, &core, provisional.as_ref())?;

        if let Err(e) = self.operation_store.insert_or_replace(&operations).await {
            tracing::warn!(
                transaction_number = transaction.transaction_number,
                error = %e,
                "Failed to store operations, will retry"
            );
            return Ok(false);
        }

        tracing::debug!(
            transaction_number = transaction.transaction_number,
            operations = operations.len(),
            "Transaction resolved"
        );
        Ok(true)
    }
}

/// Log a stage failure and report whether it is final (`true`) or worth retrying
fn classify_failure(transaction: &Transaction, stage: &str, error: &ObserverError) -> bool {
    match error {
        ObserverError::Protocol(e) if !e.is_retryable() => {
            tracing::info!(
                transaction_number = transaction.transaction_number,
                anchor_string = %transaction.anchor_string,
                stage,
                error = %e,
                "Batch failed validation"
            );
            true
        }
        e => {
            tracing::warn!(
                transaction_number = transaction.transaction_number,
                anchor_string = %transaction.anchor_string,
                stage,
                error = %e,
                "Batch not resolvable yet"
            );
            false
        }
    }
}

/// Build operation models in create, recover, deactivate, update order
fn compose_operations(
    transaction: &Transaction,
    core: &CoreFiles,
    provisional: Option<&ProvisionalFiles>,
) -> ObserverResult<Vec<AnchoredOperationModel>> {
    let model = &core.index.model;
    let creates = model.operations.create.len();
    let recovers = model.operations.recover.len();
    let deltas: &[Value] = provisional.map(|p| p.chunk.deltas()).unwrap_or(&[]);
    let delta = |i: usize| deltas.get(i).cloned();

    let recover_proofs = core.proof.as_ref().map(|p| p.recover_proofs()).unwrap_or(&[]);
    let deactivate_proofs = core.proof.as_ref().map(|p| p.deactivate_proofs()).unwrap_or(&[]);

    let mut buffers: Vec<(String, OperationType, Value)> = Vec::with_capacity(
        core.index.operation_count()
            + provisional.map(|p| p.index.update_did_suffixes.len()).unwrap_or(0),
    );

    for (i, (create, suffix)) in model
        .operations
        .create
        .iter()
        .zip(&core.index.create_did_suffixes)
        .enumerate()
    {
        let mut op = json!({
            "type": OperationType::Create,
            "suffixData": create.suffix_data,
        });
        with_delta(&mut op, delta(i));
        buffers.push((suffix.clone(), OperationType::Create, op));
    }

    for (i, (reference, proof)) in model.operations.recover.iter().zip(recover_proofs).enumerate() {
        let mut op = json!({
            "type": OperationType::Recover,
            "didSuffix": reference.did_suffix,
            "revealValue": reference.reveal_value,
            "signedData": proof.signed_data,
        });
        with_delta(&mut op, delta(creates + i));
        buffers.push((reference.did_suffix.clone(), OperationType::Recover, op));
    }

    for (reference, proof) in model.operations.deactivate.iter().zip(deactivate_proofs) {
        let op = json!({
            "type": OperationType::Deactivate,
            "didSuffix": reference.did_suffix,
            "revealValue": reference.reveal_value,
            "signedData": proof.signed_data,
        });
        buffers.push((reference.did_suffix.clone(), OperationType::Deactivate, op));
    }

    if let Some(provisional) = provisional {
        let update_proofs = provisional.proof.as_ref().map(|p| p.update_proofs()).unwrap_or(&[]);
        for (i, (reference, proof)) in provisional
            .index
            .update_references()
            .iter()
            .zip(update_proofs)
            .enumerate()
        {
            let mut op = json!({
                "type": OperationType::Update,
                "didSuffix": reference.did_suffix,
                "revealValue": reference.reveal_value,
                "signedData": proof.signed_data,
            });
            with_delta(&mut op, delta(creates + recovers + i));
            buffers.push((reference.did_suffix.clone(), OperationType::Update, op));
        }
    }

    buffers
        .into_iter()
        .enumerate()
        .map(|(index, (did_unique_suffix, operation_type, op))| -> ObserverResult<_> {
            Ok(AnchoredOperationModel {
                did_unique_suffix,
                operation_type,
                operation_buffer: serde_json::to_vec(&op)?,
                operation_index: index as u64,
                transaction_number: transaction.transaction_number,
                transaction_time: transaction.transaction_time,
            })
        })
        .collect()
}

fn with_delta(op: &mut Value, delta: Option<Value>) {
    if let (Some(map), Some(delta)) = (op.as_object_mut(), delta) {
        map.insert("delta".to_string(), delta);
    }
}
