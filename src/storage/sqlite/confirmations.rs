// File: src/storage/sqlite/confirmations.rs

use super::store::SqliteStore;
use crate::error::StorageError;
use crate::traits::ConfirmationRecord;
use rusqlite::{params, OptionalExtension};

impl SqliteStore {
    pub(crate) fn confirm_impl(&self, anchor_string: &str, confirmed_at: u64) -> Result<(), StorageError> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO confirmations (anchor_string, confirmed_at) VALUES (?1, ?2)
             ON CONFLICT(anchor_string) DO UPDATE SET confirmed_at = excluded.confirmed_at",
            params![anchor_string, confirmed_at as i64],
        )?;
        Ok(())
    }

    /// Un-confirm everything observed after `confirmed_at`
    pub(crate) fn reset_after_impl(&self, confirmed_at: Option<u64>) -> Result<(), StorageError> {
        let conn = self.get_conn()?;
        let reset = match confirmed_at {
            Some(t) => conn.execute(
                "UPDATE confirmations SET confirmed_at = NULL WHERE confirmed_at > ?1",
                params![t as i64],
            )?,
            None => conn.execute(
                "UPDATE confirmations SET confirmed_at = NULL WHERE confirmed_at IS NOT NULL",
                [],
            )?,
        };
        tracing::debug!(after = ?confirmed_at, reset, "Reset confirmations");
        Ok(())
    }

    pub(crate) fn get_confirmation_impl(
        &self,
        anchor_string: &str,
    ) -> Result<Option<ConfirmationRecord>, StorageError> {
        let conn = self.get_conn()?;
        let record = conn
            .query_row(
                "SELECT anchor_string, confirmed_at FROM confirmations WHERE anchor_string = ?1",
                params![anchor_string],
                |row| {
                    Ok(ConfirmationRecord {
                        anchor_string: row.get(0)?,
                        confirmed_at: row.get::<_, Option<i64>>(1)?.map(|t| t as u64),
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}
