//! Mock ledger and CAS clients for testing
//!
//! The mock ledger keeps a canonical chain in memory; replacing the chain
//! simulates a reorganization.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::{FetchError, LedgerError};
use crate::traits::{CasClient, LedgerClient, LedgerTime, ReadResult, Transaction, ValueTimeLock};

/// In-memory ledger
pub struct MockLedgerClient {
    /// Canonical chain, ordered by transaction number
    chain: Mutex<Vec<Transaction>>,

    /// Overrides the latest time derived from the chain
    latest_time: Mutex<Option<LedgerTime>>,

    locks: Mutex<HashMap<String, ValueTimeLock>>,

    /// Maximum transactions returned per read
    pub page_size: AtomicUsize,

    /// Fail every call with a network error
    pub should_fail: AtomicBool,

    pub read_count: AtomicUsize,
    pub first_valid_count: AtomicUsize,
}

impl Default for MockLedgerClient {
    fn default() -> Self {
        Self {
            chain: Mutex::new(Vec::new()),
            latest_time: Mutex::new(None),
            locks: Mutex::new(HashMap::new()),
            page_size: AtomicUsize::new(usize::MAX),
            should_fail: AtomicBool::new(false),
            read_count: AtomicUsize::new(0),
            first_valid_count: AtomicUsize::new(0),
        }
    }
}

impl MockLedgerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        let ledger = Self::default();
        ledger.set_transactions(transactions);
        ledger
    }

    /// Replace the canonical chain
    pub fn set_transactions(&self, mut transactions: Vec<Transaction>) {
        transactions.sort_by_key(|t| t.transaction_number);
        *self.chain.lock().unwrap() = transactions;
    }

    pub fn push_transaction(&self, transaction: Transaction) {
        self.chain.lock().unwrap().push(transaction);
    }

    pub fn set_latest_time(&self, time: Option<LedgerTime>) {
        *self.latest_time.lock().unwrap() = time;
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.page_size.store(page_size, Ordering::SeqCst);
    }

    pub fn set_failing(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }

    pub fn add_lock(&self, lock: ValueTimeLock) {
        self.locks.lock().unwrap().insert(lock.identifier.clone(), lock);
    }

    fn check_failing(&self) -> Result<(), LedgerError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(LedgerError::Network("mock ledger unavailable".into()));
        }
        Ok(())
    }

    fn is_canonical(chain: &[Transaction], transaction: &Transaction) -> bool {
        chain.iter().any(|t| {
            t.transaction_number == transaction.transaction_number
                && t.transaction_time_hash == transaction.transaction_time_hash
        })
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn read(
        &self,
        since_transaction_number: Option<u64>,
        transaction_time_hash: Option<&str>,
    ) -> Result<ReadResult, LedgerError> {
        self.read_count.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;

        let chain = self.chain.lock().unwrap();

        if let Some(since) = since_transaction_number {
            let known = chain.iter().any(|t| {
                t.transaction_number == since
                    && transaction_time_hash.map_or(true, |h| t.transaction_time_hash == h)
            });
            if !known {
                return Err(LedgerError::InvalidCursor {
                    since: Some(since),
                    time_hash: transaction_time_hash.map(String::from),
                });
            }
        }

        let after: Vec<Transaction> = chain
            .iter()
            .filter(|t| since_transaction_number.map_or(true, |since| t.transaction_number > since))
            .cloned()
            .collect();

        let page_size = self.page_size.load(Ordering::SeqCst);
        let more_transactions = after.len() > page_size;
        let transactions = after.into_iter().take(page_size).collect();

        Ok(ReadResult {
            more_transactions,
            transactions,
        })
    }

    async fn latest_time(&self) -> Result<LedgerTime, LedgerError> {
        self.check_failing()?;

        if let Some(time) = self.latest_time.lock().unwrap().clone() {
            return Ok(time);
        }

        Ok(self
            .chain
            .lock()
            .unwrap()
            .last()
            .map(|t| LedgerTime {
                time: t.transaction_time,
                hash: t.transaction_time_hash.clone(),
            })
            .unwrap_or(LedgerTime {
                time: 0,
                hash: String::new(),
            }))
    }

    async fn first_valid_transaction(
        &self,
        candidates: &[Transaction],
    ) -> Result<Option<Transaction>, LedgerError> {
        self.first_valid_count.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;

        let chain = self.chain.lock().unwrap();
        Ok(candidates
            .iter()
            .find(|c| Self::is_canonical(&chain, c))
            .cloned())
    }

    async fn value_time_lock(&self, identifier: &str) -> Result<Option<ValueTimeLock>, LedgerError> {
        self.check_failing()?;
        Ok(self.locks.lock().unwrap().get(identifier).cloned())
    }
}

/// In-memory content-addressable store
#[derive(Default)]
pub struct MockCasClient {
    content: Mutex<HashMap<String, Vec<u8>>>,

    /// Fail every read as unreachable
    pub unreachable: AtomicBool,

    pub read_calls: AtomicUsize,
}

impl MockCasClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uri: &str, content: Vec<u8>) {
        self.content.lock().unwrap().insert(uri.to_string(), content);
    }

    pub fn remove(&self, uri: &str) {
        self.content.lock().unwrap().remove(uri);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn read_count(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CasClient for MockCasClient {
    async fn read(&self, uri: &str, max_size_bytes: usize) -> Result<Vec<u8>, FetchError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(FetchError::Unreachable("mock CAS unavailable".into()));
        }

        match self.content.lock().unwrap().get(uri) {
            Some(content) if content.len() > max_size_bytes => {
                Err(FetchError::MaxSizeExceeded(max_size_bytes))
            }
            Some(content) => Ok(content.clone()),
            None => Err(FetchError::NotFound),
        }
    }
}
