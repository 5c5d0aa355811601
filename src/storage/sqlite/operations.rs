// File: src/storage/sqlite/operations.rs

use super::convert::row_to_operation;
use super::store::SqliteStore;
use crate::error::StorageError;
use crate::protocol::operation::AnchoredOperationModel;
use rusqlite::params;

impl SqliteStore {
    /// Insert a batch of operations atomically, replacing same-keyed rows
    pub(crate) fn insert_operations_impl(
        &self,
        operations: &[AnchoredOperationModel],
    ) -> Result<(), StorageError> {
        if operations.is_empty() {
            return Ok(());
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO operations
                 (did_unique_suffix, operation_type, operation_buffer, operation_index, transaction_number, transaction_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for op in operations {
                stmt.execute(params![
                    op.did_unique_suffix,
                    op.operation_type.as_str(),
                    op.operation_buffer,
                    op.operation_index as i64,
                    op.transaction_number as i64,
                    op.transaction_time as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub(crate) fn delete_operations_impl(&self, after: Option<u64>) -> Result<(), StorageError> {
        let conn = self.get_conn()?;
        let deleted = match after {
            Some(n) => conn.execute(
                "DELETE FROM operations WHERE transaction_number > ?1",
                params![n as i64],
            )?,
            None => conn.execute("DELETE FROM operations", [])?,
        };
        tracing::debug!(after = ?after, deleted, "Deleted operations");
        Ok(())
    }

    pub(crate) fn get_operations_impl(
        &self,
        did_unique_suffix: &str,
    ) -> Result<Vec<AnchoredOperationModel>, StorageError> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT did_unique_suffix, operation_type, operation_buffer, operation_index, transaction_number, transaction_time
             FROM operations WHERE did_unique_suffix = ?1
             ORDER BY transaction_number, operation_index",
        )?;
        let rows = stmt.query_map(params![did_unique_suffix], row_to_operation)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
