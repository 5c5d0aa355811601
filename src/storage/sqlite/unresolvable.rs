// File: src/storage/sqlite/unresolvable.rs

use super::convert::{row_to_transaction, TRANSACTION_COLUMNS};
use super::store::SqliteStore;
use crate::error::StorageError;
use crate::traits::Transaction;
use rusqlite::{params, OptionalExtension};

impl SqliteStore {
    /// Record a failed fetch
    ///
    /// The first failure is retried immediately on the next cycle. Later ones
    /// back off exponentially from the first failure, with up to 100% jitter.
    pub(crate) fn record_fetch_attempt_impl(&self, transaction: &Transaction) -> Result<(), StorageError> {
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.get_conn()?;

        let existing: Option<(i64, u32)> = conn
            .query_row(
                "SELECT first_fetch_time, retry_attempts FROM unresolvable_transactions
                 WHERE transaction_number = ?1",
                params![transaction.transaction_number as i64],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match existing {
            None => {
                conn.execute(
                    &format!(
                        "INSERT INTO unresolvable_transactions ({}, first_fetch_time, retry_attempts, next_retry_time)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?8)",
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
                        now,
                    ],
                )?;
            }
            Some((first_fetch_time, attempts)) => {
                let jitter = 1.0 + rand::random::<f64>();
                let delay = self.config().unresolvable.base_delay_ms(attempts) * jitter;
                let next_retry_time = first_fetch_time.saturating_add(delay.min(i64::MAX as f64) as i64);

                conn.execute(
                    "UPDATE unresolvable_transactions
                     SET retry_attempts = ?2, next_retry_time = ?3
                     WHERE transaction_number = ?1",
                    params![
                        transaction.transaction_number as i64,
                        attempts + 1,
                        next_retry_time,
                    ],
                )?;

                tracing::debug!(
                    transaction_number = transaction.transaction_number,
                    attempts = attempts + 1,
                    next_retry_time,
                    "Scheduled retry for unresolvable transaction"
                );
            }
        }

        Ok(())
    }

    pub(crate) fn remove_unresolvable_impl(&self, transaction: &Transaction) -> Result<(), StorageError> {
        let conn = self.get_conn()?;
        conn.execute(
            "DELETE FROM unresolvable_transactions WHERE transaction_number = ?1",
            params![transaction.transaction_number as i64],
        )?;
        Ok(())
    }

    pub(crate) fn due_for_retry_impl(&self, max_count: Option<usize>) -> Result<Vec<Transaction>, StorageError> {
        let now = chrono::Utc::now().timestamp_millis();
        let limit = max_count.map(|n| n as i64).unwrap_or(-1);

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM unresolvable_transactions
             WHERE next_retry_time <= ?1
             ORDER BY transaction_time, transaction_number
             LIMIT ?2",
            TRANSACTION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![now, limit], row_to_transaction)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub(crate) fn remove_unresolvable_later_than_impl(
        &self,
        transaction_number: Option<u64>,
    ) -> Result<(), StorageError> {
        let conn = self.get_conn()?;
        match transaction_number {
            Some(n) => conn.execute(
                "DELETE FROM unresolvable_transactions WHERE transaction_number > ?1",
                params![n as i64],
            )?,
            None => conn.execute("DELETE FROM unresolvable_transactions", [])?,
        };
        Ok(())
    }

    #[cfg(test)]
    fn retry_state(&self, transaction_number: u64) -> Option<(i64, u32, i64)> {
        let conn = self.get_conn().unwrap();
        conn.query_row(
            "SELECT first_fetch_time, retry_attempts, next_retry_time FROM unresolvable_transactions
             WHERE transaction_number = ?1",
            params![transaction_number as i64],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()
        .unwrap()
    }
}
