//! Unit tests for the observer loop with mock ledger and protocol versions

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{Observer, ObserverConfig};
use crate::clients::mock::MockLedgerClient;
use crate::error::{ObserverError, ObserverResult, StorageError};
use crate::storage::{SqliteConfig, SqliteStore, UnresolvableConfig};
use crate::traits::{
    ConfirmationStore, LedgerTime, Transaction, TransactionProcessor,
    TransactionSelector, TransactionStore, UnresolvableTransactionStore, VersionManager,
};

/// Processor that succeeds unless told otherwise
#[derive(Default)]
struct MockProcessor {
    /// Transaction numbers to report as not fully processed
    retry: Mutex<HashSet<u64>>,
    /// Transaction numbers held until their gate is notified
    gates: Mutex<HashMap<u64, Arc<Notify>>>,
    processed: Mutex<Vec<u64>>,
    calls: AtomicUsize,
}

impl MockProcessor {
    fn set_retry(&self, transaction_number: u64, retry: bool) {
        let mut set = self.retry.lock().unwrap();
        if retry {
            set.insert(transaction_number);
        } else {
            set.remove(&transaction_number);
        }
    }

    /// Hold resolution of `transaction_number` until the returned gate opens
    fn hold(&self, transaction_number: u64) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(transaction_number, gate.clone());
        gate
    }

    fn processed(&self) -> Vec<u64> {
        self.processed.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionProcessor for MockProcessor {
    async fn process_transaction(&self, transaction: &Transaction) -> ObserverResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(&transaction.transaction_number).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.retry.lock().unwrap().contains(&transaction.transaction_number) {
            return Ok(false);
        }
        self.processed.lock().unwrap().push(transaction.transaction_number);
        Ok(true)
    }
}

/// Selector that admits everything and remembers the groups it saw
#[derive(Default)]
struct RecordingSelector {
    groups: Mutex<Vec<Vec<u64>>>,
}

#[async_trait]
impl TransactionSelector for RecordingSelector {
    async fn select_qualified_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> ObserverResult<Vec<Transaction>> {
        self.groups
            .lock()
            .unwrap()
            .push(transactions.iter().map(|t| t.transaction_time).collect());
        Ok(transactions)
    }
}

struct MockVersions {
    processor: Arc<MockProcessor>,
    selector: Arc<RecordingSelector>,
    /// Ledger times with no processor
    missing_processor: Mutex<HashSet<u64>>,
}

impl MockVersions {
    fn new() -> Self {
        Self {
            processor: Arc::new(MockProcessor::default()),
            selector: Arc::new(RecordingSelector::default()),
            missing_processor: Mutex::new(HashSet::new()),
        }
    }
}

impl VersionManager for MockVersions {
    fn transaction_processor(&self, transaction_time: u64) -> ObserverResult<Arc<dyn TransactionProcessor>> {
        if self.missing_processor.lock().unwrap().contains(&transaction_time) {
            return Err(ObserverError::VersionNotFound(transaction_time));
        }
        Ok(self.processor.clone() as Arc<dyn TransactionProcessor>)
    }

    fn transaction_selector(&self, _transaction_time: u64) -> ObserverResult<Arc<dyn TransactionSelector>> {
        Ok(self.selector.clone() as Arc<dyn TransactionSelector>)
    }
}

/// Unresolvable store whose writes always fail
#[derive(Default)]
struct BrokenUnresolvableStore {
    attempts: AtomicUsize,
}

#[async_trait]
impl UnresolvableTransactionStore for BrokenUnresolvableStore {
    async fn record_fetch_attempt(&self, _transaction: &Transaction) -> Result<(), StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Database("disk full".into()))
    }

    async fn remove(&self, _transaction: &Transaction) -> Result<(), StorageError> {
        Ok(())
    }

    async fn due_for_retry(&self, _max_count: Option<usize>) -> Result<Vec<Transaction>, StorageError> {
        Ok(Vec::new())
    }

    async fn remove_later_than(&self, _transaction_number: Option<u64>) -> Result<(), StorageError> {
        Ok(())
    }
}

fn tx(number: u64, time: u64, fork: &str) -> Transaction {
    Transaction {
        transaction_number: number,
        transaction_time: time,
        transaction_time_hash: format!("{}-{}", fork, time),
        anchor_string: format!("1.Qm{}{}", fork, number),
        transaction_fee_paid: 100,
        normalized_transaction_fee: 1,
        writer: format!("writer{}", number),
    }
}

fn chain(numbers: std::ops::RangeInclusive<u64>, fork: &str) -> Vec<Transaction> {
    numbers.map(|n| tx(n, n, fork)).collect()
}

struct Harness {
    ledger: Arc<MockLedgerClient>,
    versions: Arc<MockVersions>,
    store: Arc<SqliteStore>,
    observer: Observer,
}

fn harness(transactions: Vec<Transaction>) -> Harness {
    harness_with(transactions, None, ObserverConfig::default())
}

fn harness_with(
    transactions: Vec<Transaction>,
    unresolvable: Option<Arc<dyn UnresolvableTransactionStore>>,
    config: ObserverConfig,
) -> Harness {
    let ledger = Arc::new(MockLedgerClient::with_transactions(transactions));
    let versions = Arc::new(MockVersions::new());
    // zero backoff keeps every unresolvable transaction due
    let store = Arc::new(
        SqliteStore::with_config(SqliteConfig {
            path: ":memory:".into(),
            wal_mode: false,
            unresolvable: UnresolvableConfig {
                exponential_delay_factor_ms: 0,
            },
            ..Default::default()
        })
        .unwrap(),
    );
    let unresolvable =
        unresolvable.unwrap_or_else(|| store.clone() as Arc<dyn UnresolvableTransactionStore>);

    let observer = Observer::new(
        ledger.clone(),
        versions.clone(),
        store.clone(),
        store.clone(),
        unresolvable,
        store.clone(),
        config,
    );

    Harness {
        ledger,
        versions,
        store,
        observer,
    }
}

async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Condition not reached in time");
}

async fn committed(store: &SqliteStore) -> Vec<u64> {
    store
        .transactions()
        .await
        .unwrap()
        .iter()
        .map(|t| t.transaction_number)
        .collect()
}

#[tokio::test]
async fn test_commits_transactions_in_order() {
    let mut h = harness(chain(1..=5, "a"));

    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();

    assert_eq!(committed(&h.store).await, vec![1, 2, 3, 4, 5]);
    assert_eq!(h.observer.cursor().map(|t| t.transaction_number), Some(5));
    assert_eq!(h.observer.pending(), 0);

    let mut processed = h.versions.processor.processed();
    processed.sort();
    assert_eq!(processed, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_reads_all_pages_in_one_cycle() {
    let mut h = harness(chain(1..=7, "a"));
    h.ledger.set_page_size(2);

    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();

    assert_eq!(committed(&h.store).await, (1..=7).collect::<Vec<_>>());
    assert_eq!(h.ledger.read_count.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_second_cycle_reads_after_cursor() {
    let mut h = harness(chain(1..=3, "a"));
    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();

    h.ledger.push_transaction(tx(4, 4, "a"));
    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();

    assert_eq!(committed(&h.store).await, vec![1, 2, 3, 4]);
    assert_eq!(h.versions.processor.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_resumes_from_last_committed_transaction() {
    let h = harness(chain(1..=4, "a"));
    h.store.add_transaction(&tx(1, 1, "a")).await.unwrap();
    h.store.add_transaction(&tx(2, 2, "a")).await.unwrap();

    let mut observer = h.observer;
    observer.process_once().await.unwrap();
    observer.settle().await.unwrap();

    assert_eq!(h.versions.processor.processed().len(), 2);
    assert_eq!(committed(&h.store).await, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_groups_by_transaction_time() {
    let transactions = vec![tx(1, 10, "a"), tx(2, 10, "a"), tx(3, 11, "a"), tx(4, 12, "a")];
    let mut h = harness(transactions);

    h.observer.process_once().await.unwrap();

    let groups = h.versions.selector.groups.lock().unwrap().clone();
    assert_eq!(groups, vec![vec![10, 10], vec![11], vec![12]]);
}

#[tokio::test]
async fn test_retryable_transaction_is_committed_and_retried() {
    let mut h = harness(chain(1..=2, "a"));
    h.versions.processor.set_retry(2, true);

    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();

    assert_eq!(committed(&h.store).await, vec![1, 2]);
    let due = h.store.due_for_retry(None).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].transaction_number, 2);

    h.versions.processor.set_retry(2, false);
    h.observer.process_once().await.unwrap();

    assert!(h.store.due_for_retry(None).await.unwrap().is_empty());
    assert!(h.versions.processor.processed().contains(&2));
}

#[tokio::test]
async fn test_missing_processor_counts_as_retryable() {
    let mut h = harness(chain(1..=1, "a"));
    h.versions.missing_processor.lock().unwrap().insert(1);

    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();

    assert_eq!(committed(&h.store).await, vec![1]);
    assert_eq!(h.store.due_for_retry(None).await.unwrap().len(), 1);
    assert_eq!(h.versions.processor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_confirms_anchor_even_when_retryable() {
    let mut h = harness(chain(1..=1, "a"));
    h.versions.processor.set_retry(1, true);

    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();

    let record = ConfirmationStore::get(h.store.as_ref(), "1.Qma1").await.unwrap().unwrap();
    assert_eq!(record.confirmed_at, Some(1));
}

#[tokio::test]
async fn test_bookkeeping_failure_blocks_commit_and_resets_cursor() {
    let config = ObserverConfig {
        max_concurrent_downloads: 0,
        ..Default::default()
    };
    let mut h = harness_with(chain(1..=3, "a"), Some(Arc::new(BrokenUnresolvableStore::default())), config);
    h.versions.processor.set_retry(2, true);

    h.observer.process_once().await.unwrap();

    assert_eq!(committed(&h.store).await, vec![1]);
    assert!(h.observer.cursor().is_none());
    assert_eq!(h.observer.pending(), 0);

    // the next cycle starts over after the last committed transaction
    h.versions.processor.set_retry(2, false);
    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();
    assert_eq!(committed(&h.store).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_blocked_front_holds_back_later_commits() {
    let mut h = harness(chain(1..=4, "a"));
    let gate = h.versions.processor.hold(1);

    h.observer.process_once().await.unwrap();
    wait_until(|| h.versions.processor.processed().len() == 3).await;

    // 2, 3 and 4 are resolved, 1 is not
    h.observer.process_once().await.unwrap();
    assert!(committed(&h.store).await.is_empty());
    assert_eq!(h.observer.pending(), 4);

    gate.notify_one();
    h.observer.settle().await.unwrap();

    assert_eq!(committed(&h.store).await, vec![1, 2, 3, 4]);
    assert_eq!(h.versions.processor.processed().last(), Some(&1));
    assert_eq!(h.observer.pending(), 0);
}

#[tokio::test]
async fn test_failure_behind_blocked_front_abandons_window() {
    let broken = Arc::new(BrokenUnresolvableStore::default());
    let mut h = harness_with(
        chain(1..=4, "a"),
        Some(broken.clone() as Arc<dyn UnresolvableTransactionStore>),
        ObserverConfig::default(),
    );
    let gate = h.versions.processor.hold(1);
    h.versions.processor.set_retry(3, true);

    h.observer.process_once().await.unwrap();
    assert!(committed(&h.store).await.is_empty());
    assert_eq!(h.observer.pending(), 4);

    wait_until(|| broken.attempts.load(Ordering::SeqCst) == 1).await;

    let release = gate.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        release.notify_one();
    });

    // 3 failed while 1 is still resolving
    h.observer.process_once().await.unwrap();

    assert_eq!(committed(&h.store).await, vec![1, 2]);
    assert_eq!(h.observer.pending(), 0);
    assert!(h.observer.cursor().is_none());
}

#[tokio::test]
async fn test_reorganization_rolls_back_to_valid_transaction() {
    let mut h = harness(chain(1..=5, "a"));
    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();

    // transactions 4 and 5 are replaced by a fork that also adds 6
    let mut fork = chain(1..=3, "a");
    fork.extend(vec![tx(4, 4, "b"), tx(5, 5, "b"), tx(6, 6, "b")]);
    h.ledger.set_transactions(fork);

    h.observer.process_once().await.unwrap();
    assert_eq!(h.ledger.first_valid_count.load(Ordering::SeqCst), 1);
    assert!(h.observer.cursor().is_none());

    // samples are 5, 4 and 2; 2 is the newest still on the ledger
    assert_eq!(committed(&h.store).await, vec![1, 2]);
    let old = ConfirmationStore::get(h.store.as_ref(), "1.Qma5").await.unwrap().unwrap();
    assert_eq!(old.confirmed_at, None);
    let kept = ConfirmationStore::get(h.store.as_ref(), "1.Qma2").await.unwrap().unwrap();
    assert_eq!(kept.confirmed_at, Some(2));

    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();

    let stored = h.store.transactions().await.unwrap();
    let hashes: Vec<&str> = stored.iter().map(|t| t.transaction_time_hash.as_str()).collect();
    assert_eq!(hashes, vec!["a-1", "a-2", "a-3", "b-4", "b-5", "b-6"]);
}

#[tokio::test]
async fn test_invalid_cursor_ahead_of_ledger_waits() {
    let mut h = harness(chain(1..=5, "a"));
    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();

    // the ledger lost its tip but has not caught back up to the cursor
    h.ledger.set_transactions(chain(1..=3, "a"));
    h.ledger.set_latest_time(Some(LedgerTime {
        time: 3,
        hash: "a-3".into(),
    }));

    h.observer.process_once().await.unwrap();

    assert_eq!(h.ledger.first_valid_count.load(Ordering::SeqCst), 0);
    assert_eq!(committed(&h.store).await, vec![1, 2, 3, 4, 5]);
    assert_eq!(h.observer.cursor().map(|t| t.transaction_number), Some(5));
}

#[tokio::test]
async fn test_ledger_failure_fails_cycle() {
    let mut h = harness(chain(1..=2, "a"));
    h.ledger.set_failing(true);

    let result = h.observer.process_once().await;
    assert!(matches!(result, Err(ObserverError::Ledger(_))));
    assert!(committed(&h.store).await.is_empty());
}

#[tokio::test]
async fn test_retry_batch_is_bounded() {
    let config = ObserverConfig {
        max_retry_batch: 1,
        ..Default::default()
    };
    let mut h = harness_with(chain(1..=3, "a"), None, config);
    for n in 1..=3 {
        h.versions.processor.set_retry(n, true);
    }

    h.observer.process_once().await.unwrap();
    h.observer.settle().await.unwrap();
    let calls_before = h.versions.processor.calls.load(Ordering::SeqCst);

    h.observer.process_once().await.unwrap();
    let retried = h.versions.processor.calls.load(Ordering::SeqCst) - calls_before;
    assert_eq!(retried, 1);
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let config = ObserverConfig {
        interval_secs: 3600,
        ..Default::default()
    };
    let h = harness_with(chain(1..=2, "a"), None, config);
    let store = h.store.clone();
    let mut observer = h.observer;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let handle = tokio::spawn(async move {
        observer.run(shutdown_rx).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(1), handle).await;
    assert!(result.is_ok(), "Observer should shutdown gracefully");

    // the first tick fires immediately, shutdown commits what was in flight
    assert_eq!(committed(&store).await, vec![1, 2]);
}

#[tokio::test]
async fn test_empty_ledger_is_noop() {
    let mut h = harness(Vec::new());

    h.observer.process_once().await.unwrap();
    assert!(committed(&h.store).await.is_empty());
    assert!(h.observer.cursor().is_none());
    assert_eq!(h.ledger.read_count.load(Ordering::SeqCst), 1);
}
