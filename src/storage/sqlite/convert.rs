// File: src/storage/sqlite/convert.rs

use crate::protocol::operation::{AnchoredOperationModel, OperationType};
use crate::traits::Transaction;
use rusqlite::Row;

/// Column list matching `row_to_transaction`
pub const TRANSACTION_COLUMNS: &str = "transaction_number, transaction_time, transaction_time_hash, \
     anchor_string, transaction_fee_paid, normalized_transaction_fee, writer";

/// Convert a database row to Transaction
pub fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        transaction_number: row.get::<_, i64>(0)? as u64,
        transaction_time: row.get::<_, i64>(1)? as u64,
        transaction_time_hash: row.get(2)?,
        anchor_string: row.get(3)?,
        transaction_fee_paid: row.get::<_, i64>(4)? as u64,
        normalized_transaction_fee: row.get::<_, i64>(5)? as u64,
        writer: row.get(6)?,
    })
}

/// Convert a database row to AnchoredOperationModel
pub fn row_to_operation(row: &Row) -> rusqlite::Result<AnchoredOperationModel> {
    let operation_type: String = row.get(1)?;

    Ok(AnchoredOperationModel {
        did_unique_suffix: row.get(0)?,
        operation_type: operation_type.parse::<OperationType>().map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                1,
                "operation_type".into(),
                rusqlite::types::Type::Text,
            )
        })?,
        operation_buffer: row.get(2)?,
        operation_index: row.get::<_, i64>(3)? as u64,
        transaction_number: row.get::<_, i64>(4)? as u64,
        transaction_time: row.get::<_, i64>(5)? as u64,
    })
}
