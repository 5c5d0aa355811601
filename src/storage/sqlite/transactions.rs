// File: src/storage/sqlite/transactions.rs

use super::convert::{row_to_transaction, TRANSACTION_COLUMNS};
use super::store::SqliteStore;
use crate::error::StorageError;
use crate::traits::Transaction;
use rusqlite::{params, OptionalExtension};

impl SqliteStore {
    pub(crate) fn last_transaction_impl(&self) -> Result<Option<Transaction>, StorageError> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM transactions ORDER BY transaction_number DESC LIMIT 1",
            TRANSACTION_COLUMNS
        );
        Ok(conn.query_row(&sql, [], row_to_transaction).optional()?)
    }

    /// Commit a transaction; a second commit of the same number is ignored
    pub(crate) fn add_transaction_impl(&self, transaction: &Transaction) -> Result<(), StorageError> {
        let conn = self.get_conn()?;
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO transactions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                TRANSACTION_COLUMNS
            ),
            params![
                transaction.transaction_number as i64,
                transaction.transaction_time as i64,
                transaction.transaction_time_hash,
                transaction.anchor_string,
                transaction.transaction_fee_paid as i64,
                transaction.normalized_transaction_fee as i64,
                transaction.writer,
            ],
        )?;
        Ok(())
    }

    pub(crate) fn transactions_in_time_range_impl(
        &self,
        from_inclusive: u64,
        to_exclusive: u64,
    ) -> Result<Vec<Transaction>, StorageError> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions
             WHERE transaction_time >= ?1 AND transaction_time < ?2
             ORDER BY transaction_number",
            TRANSACTION_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![from_inclusive as i64, to_exclusive as i64],
            row_to_transaction,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Sample at offsets 0, 1, 3, 7, 15, ... from the newest transaction
    pub(crate) fn exponentially_spaced_transactions_impl(&self) -> Result<Vec<Transaction>, StorageError> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY transaction_number DESC LIMIT 1 OFFSET ?1",
            TRANSACTION_COLUMNS
        ))?;

        let mut samples = Vec::new();
        let mut offset: i64 = 0;
        let mut distance: i64 = 1;
        while offset < count {
            samples.push(stmt.query_row(params![offset], row_to_transaction)?);
            offset += distance;
            distance *= 2;
        }

        Ok(samples)
    }

    pub(crate) fn remove_transactions_later_than_impl(
        &self,
        transaction_number: Option<u64>,
    ) -> Result<(), StorageError> {
        let conn = self.get_conn()?;
        match transaction_number {
            Some(n) => conn.execute(
                "DELETE FROM transactions WHERE transaction_number > ?1",
                params![n as i64],
            )?,
            None => conn.execute("DELETE FROM transactions", [])?,
        };
        Ok(())
    }

    pub(crate) fn transactions_impl(&self) -> Result<Vec<Transaction>, StorageError> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM transactions ORDER BY transaction_number",
            TRANSACTION_COLUMNS
        ))?;
        let rows = stmt.query_map([], row_to_transaction)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
