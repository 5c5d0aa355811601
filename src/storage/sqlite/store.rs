// File: src/storage/sqlite/store.rs

use super::config::SqliteConfig;
use super::schema;
use crate::error::StorageError;
use crate::protocol::operation::AnchoredOperationModel;
use crate::traits::{
    ConfirmationRecord, ConfirmationStore, OperationStore, Transaction, TransactionStore,
    UnresolvableTransactionStore,
};
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// SQLite implementation of the operation, transaction, unresolvable
/// transaction and confirmation stores
///
/// Every store call runs in the calling task while holding the connection
/// lock; calls are short single-table statements.
pub struct SqliteStore {
    /// Database connection (protected by mutex for thread safety)
    conn: Arc<Mutex<Connection>>,

    config: SqliteConfig,
}

impl SqliteStore {
    /// Create a new SqliteStore with default configuration
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let config = SqliteConfig {
            path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Create with custom configuration
    pub fn with_config(config: SqliteConfig) -> Result<Self, StorageError> {
        let conn = Connection::open(&config.path)
            .map_err(|e| StorageError::ConnectionFailed(format!("failed to open db: {}", e)))?;

        Self::configure_connection(&conn, &config)?;
        schema::create_tables(&conn)?;

        tracing::debug!(path = %config.path, "SQLite store opened");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        let config = SqliteConfig {
            path: ":memory:".to_string(),
            wal_mode: false,
            ..Default::default()
        };
        Self::with_config(config)
    }

    /// Configure SQLite connection pragmas
    fn configure_connection(conn: &Connection, config: &SqliteConfig) -> Result<(), StorageError> {
        if config.wal_mode {
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        conn.pragma_update(None, "busy_timeout", config.busy_timeout_ms)?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Get locked connection for internal operations
    pub(crate) fn get_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::ConnectionFailed("lock poisoned".into()))
    }
}

#[async_trait]
impl OperationStore for SqliteStore {
    async fn insert_or_replace(&self, operations: &[AnchoredOperationModel]) -> Result<(), StorageError> {
        self.insert_operations_impl(operations)
    }

    async fn delete(&self, after_transaction_number: Option<u64>) -> Result<(), StorageError> {
        self.delete_operations_impl(after_transaction_number)
    }

    async fn get(&self, did_unique_suffix: &str) -> Result<Vec<AnchoredOperationModel>, StorageError> {
        self.get_operations_impl(did_unique_suffix)
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn last_transaction(&self) -> Result<Option<Transaction>, StorageError> {
        self.last_transaction_impl()
    }

    async fn add_transaction(&self, transaction: &Transaction) -> Result<(), StorageError> {
        self.add_transaction_impl(transaction)
    }

    async fn transactions_starting_from(
        &self,
        from_time_inclusive: u64,
        to_time_exclusive: u64,
    ) -> Result<Vec<Transaction>, StorageError> {
        self.transactions_in_time_range_impl(from_time_inclusive, to_time_exclusive)
    }

    async fn exponentially_spaced_transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        self.exponentially_spaced_transactions_impl()
    }

    async fn remove_transactions_later_than(
        &self,
        transaction_number: Option<u64>,
    ) -> Result<(), StorageError> {
        self.remove_transactions_later_than_impl(transaction_number)
    }

    async fn transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        self.transactions_impl()
    }
}

#[async_trait]
impl UnresolvableTransactionStore for SqliteStore {
    async fn record_fetch_attempt(&self, transaction: &Transaction) -> Result<(), StorageError> {
        self.record_fetch_attempt_impl(transaction)
    }

    async fn remove(&self, transaction: &Transaction) -> Result<(), StorageError> {
        self.remove_unresolvable_impl(transaction)
    }

    async fn due_for_retry(&self, max_count: Option<usize>) -> Result<Vec<Transaction>, StorageError> {
        self.due_for_retry_impl(max_count)
    }

    async fn remove_later_than(&self, transaction_number: Option<u64>) -> Result<(), StorageError> {
        self.remove_unresolvable_later_than_impl(transaction_number)
    }
}

#[async_trait]
impl ConfirmationStore for SqliteStore {
    async fn confirm(&self, anchor_string: &str, confirmed_at: u64) -> Result<(), StorageError> {
        self.confirm_impl(anchor_string, confirmed_at)
    }

    async fn reset_after(&self, confirmed_at: Option<u64>) -> Result<(), StorageError> {
        self.reset_after_impl(confirmed_at)
    }

    async fn get(&self, anchor_string: &str) -> Result<Option<ConfirmationRecord>, StorageError> {
        self.get_confirmation_impl(anchor_string)
    }
}
