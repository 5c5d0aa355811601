//! Test fixtures and observer setup utilities

use serde_json::json;
use std::sync::Arc;

use sidetree_observer::clients::{MockCasClient, MockLedgerClient};
use sidetree_observer::protocol::encoding::canonicalize_then_hash_then_encode;
use sidetree_observer::protocol::files::{
    encode_file, ChunkFileModel, ChunkReference, CoreIndexFileModel, CoreOperations,
    CreateReference, ProvisionalIndexFileModel, SuffixData,
};
use sidetree_observer::protocol::{ProtocolParameters, ProtocolVersionManager, ProtocolVersions};
use sidetree_observer::storage::{SqliteConfig, UnresolvableConfig};
use sidetree_observer::{Observer, ObserverConfig, SqliteStore, Transaction};

/// Observer wired to in-memory collaborators
pub struct TestNode {
    pub ledger: Arc<MockLedgerClient>,
    pub cas: Arc<MockCasClient>,
    pub store: Arc<SqliteStore>,
    pub observer: Observer,
}

impl TestNode {
    pub fn new() -> Self {
        Self::with_parameters(ProtocolParameters::default())
    }

    pub fn with_parameters(parameters: ProtocolParameters) -> Self {
        let ledger = Arc::new(MockLedgerClient::new());
        let cas = Arc::new(MockCasClient::new());
        // zero backoff: unresolvable transactions are due on every cycle
        let store = Arc::new(
            SqliteStore::with_config(SqliteConfig {
                path: ":memory:".into(),
                wal_mode: false,
                unresolvable: UnresolvableConfig {
                    exponential_delay_factor_ms: 0,
                },
                ..Default::default()
            })
            .expect("Failed to create in-memory storage"),
        );

        let versions = ProtocolVersionManager::new(
            Arc::new(ProtocolVersions::single(parameters)),
            ledger.clone(),
            cas.clone(),
            store.clone(),
            store.clone(),
        );

        let observer = Observer::new(
            ledger.clone(),
            Arc::new(versions),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            ObserverConfig::default(),
        );

        Self {
            ledger,
            cas,
            store,
            observer,
        }
    }

    /// Run one cycle and wait for every dispatched transaction
    pub async fn observe(&mut self) {
        self.observer.process_once().await.expect("Observer cycle failed");
        self.observer.settle().await.expect("Failed to settle observer");
    }
}

/// Suffix data of the `n`-th create in a batch tagged `tag`
pub fn suffix_data(tag: &str, n: usize) -> SuffixData {
    SuffixData {
        delta_hash: format!("{}-delta-{}", tag, n),
        recovery_commitment: format!("{}-commitment-{}", tag, n),
        did_type: None,
        anchor_origin: None,
    }
}

/// DID unique suffix of a create with the given suffix data
pub fn did_suffix(suffix_data: &SuffixData) -> String {
    canonicalize_then_hash_then_encode(&serde_json::to_value(suffix_data).unwrap())
}

/// URIs of the files of a published create batch
pub struct PublishedBatch {
    pub anchor_string: String,
    pub core_index_uri: String,
    pub provisional_index_uri: String,
    pub chunk_uri: String,
    pub did_suffixes: Vec<String>,
}

/// Write a batch of `count` creates to the CAS
///
/// `tag` must be alphanumeric; it makes the file URIs and DIDs unique.
pub fn publish_creates(cas: &MockCasClient, tag: &str, count: usize) -> PublishedBatch {
    let core_index_uri = format!("QmCore{}", tag);
    let provisional_index_uri = format!("QmProvisional{}", tag);
    let chunk_uri = format!("QmChunk{}", tag);

    let creates: Vec<SuffixData> = (0..count).map(|n| suffix_data(tag, n)).collect();
    let deltas = (0..count)
        .map(|n| json!({"patches": [], "updateCommitment": format!("{}-update-{}", tag, n)}))
        .collect();

    cas.insert(&chunk_uri, encode_file(&ChunkFileModel { deltas }).unwrap());
    cas.insert(
        &provisional_index_uri,
        encode_file(&ProvisionalIndexFileModel {
            provisional_proof_file_uri: None,
            chunks: vec![ChunkReference {
                chunk_file_uri: chunk_uri.clone(),
            }],
            operations: None,
        })
        .unwrap(),
    );
    cas.insert(
        &core_index_uri,
        encode_file(&CoreIndexFileModel {
            writer_lock_id: None,
            provisional_index_file_uri: Some(provisional_index_uri.clone()),
            core_proof_file_uri: None,
            operations: CoreOperations {
                create: creates
                    .iter()
                    .cloned()
                    .map(|suffix_data| CreateReference { suffix_data })
                    .collect(),
                ..Default::default()
            },
        })
        .unwrap(),
    );

    PublishedBatch {
        anchor_string: format!("{}.{}", count, core_index_uri),
        core_index_uri,
        provisional_index_uri,
        chunk_uri,
        did_suffixes: creates.iter().map(did_suffix).collect(),
    }
}

/// Build a transaction on the fork named `fork`
pub fn transaction(number: u64, time: u64, fork: &str, anchor_string: &str) -> Transaction {
    Transaction {
        transaction_number: number,
        transaction_time: time,
        transaction_time_hash: format!("{}-{}", fork, time),
        anchor_string: anchor_string.to_string(),
        transaction_fee_paid: 1_000_000,
        normalized_transaction_fee: 100,
        writer: format!("writer-{}", number),
    }
}
