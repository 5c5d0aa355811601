//! Value time lock verification
//!
//! Writers anchoring more than the free operation limit must hold a lock whose
//! amount pays for every operation in the batch.

use super::error::ProtocolError;
use super::parameters::ProtocolParameters;
use super::versions::ProtocolVersions;
use crate::traits::ValueTimeLock;

/// Number of operations a lock pays for, using the multipliers of the version
/// active when the lock was created
pub fn max_operations_allowed(
    lock: Option<&ValueTimeLock>,
    params: &ProtocolParameters,
    versions: &ProtocolVersions,
) -> Result<u64, ProtocolError> {
    let lock = match lock {
        None => return Ok(params.max_number_of_operations_for_no_value_time_lock as u64),
        Some(lock) => lock,
    };

    let lock_params = versions.parameters_at(lock.lock_transaction_time)?;
    let fee_per_operation =
        lock.normalized_fee as f64 * lock_params.normalized_fee_to_per_operation_fee_multiplier;
    let amount_per_operation = fee_per_operation * lock_params.value_time_lock_amount_multiplier as f64;

    if amount_per_operation <= 0.0 {
        return Ok(u64::MAX);
    }

    Ok((lock.amount_locked as f64 / amount_per_operation).floor() as u64)
}

/// Verify that `lock` authorizes `number_of_operations` for `writer` at `transaction_time`
pub fn verify_lock_amount(
    lock: Option<&ValueTimeLock>,
    number_of_operations: u32,
    transaction_time: u64,
    writer: &str,
    params: &ProtocolParameters,
    versions: &ProtocolVersions,
) -> Result<(), ProtocolError> {
    if number_of_operations <= params.max_number_of_operations_for_no_value_time_lock {
        return Ok(());
    }

    let lock = lock.ok_or(ProtocolError::ValueTimeLockRequired {
        operations: number_of_operations,
        max_free: params.max_number_of_operations_for_no_value_time_lock,
    })?;

    if transaction_time < lock.lock_transaction_time
        || transaction_time >= lock.unlock_transaction_time
    {
        return Err(ProtocolError::ValueTimeLockTransactionTimeOutsideLockRange {
            time: transaction_time,
            lock_time: lock.lock_transaction_time,
            unlock_time: lock.unlock_transaction_time,
        });
    }

    if lock.owner != writer {
        return Err(ProtocolError::ValueTimeLockOwnerMismatch {
            owner: lock.owner.clone(),
            writer: writer.to_string(),
        });
    }

    let allowed = max_operations_allowed(Some(lock), params, versions)?;
    if allowed < number_of_operations as u64 {
        return Err(ProtocolError::ValueTimeLockInsufficientAmount {
            allowed,
            requested: number_of_operations,
        });
    }

    Ok(())
}
