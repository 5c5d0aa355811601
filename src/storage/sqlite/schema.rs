// File: src/storage/sqlite/schema.rs

use crate::error::StorageError;
use rusqlite::Connection;

/// Create all tables (idempotent)
pub fn create_tables(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

// u64 values are stored as their i64 bit pattern
const SCHEMA_SQL: &str = r#"
-- Decoded operations, keyed like the operation store contract
CREATE TABLE IF NOT EXISTS operations (
    did_unique_suffix TEXT NOT NULL,
    operation_type TEXT NOT NULL,           -- create | recover | deactivate | update
    operation_buffer BLOB NOT NULL,         -- UTF-8 JSON
    operation_index INTEGER NOT NULL,
    transaction_number INTEGER NOT NULL,
    transaction_time INTEGER NOT NULL,
    PRIMARY KEY (did_unique_suffix, transaction_number, operation_index)
);

CREATE INDEX IF NOT EXISTS idx_operations_transaction_number
    ON operations(transaction_number);

-- Committed ledger transactions
CREATE TABLE IF NOT EXISTS transactions (
    transaction_number INTEGER PRIMARY KEY,
    transaction_time INTEGER NOT NULL,
    transaction_time_hash TEXT NOT NULL,
    anchor_string TEXT NOT NULL,
    transaction_fee_paid INTEGER NOT NULL,
    normalized_transaction_fee INTEGER NOT NULL,
    writer TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_time
    ON transactions(transaction_time);

-- Transactions waiting for their batch files to become available
CREATE TABLE IF NOT EXISTS unresolvable_transactions (
    transaction_number INTEGER PRIMARY KEY,
    transaction_time INTEGER NOT NULL,
    transaction_time_hash TEXT NOT NULL,
    anchor_string TEXT NOT NULL,
    transaction_fee_paid INTEGER NOT NULL,
    normalized_transaction_fee INTEGER NOT NULL,
    writer TEXT NOT NULL,
    first_fetch_time INTEGER NOT NULL,      -- Unix milliseconds
    retry_attempts INTEGER NOT NULL,
    next_retry_time INTEGER NOT NULL        -- Unix milliseconds
);

CREATE INDEX IF NOT EXISTS idx_unresolvable_next_retry
    ON unresolvable_transactions(next_retry_time);

-- Ledger time at which each anchor string was observed
CREATE TABLE IF NOT EXISTS confirmations (
    anchor_string TEXT PRIMARY KEY,
    confirmed_at INTEGER                    -- NULL = not confirmed
);
"#;
