//! Transaction fee rule

use super::error::ProtocolError;
use super::parameters::ProtocolParameters;

/// Minimum fee a writer must pay to anchor `number_of_operations` operations
pub fn compute_minimum_transaction_fee(
    normalized_fee: u64,
    number_of_operations: u32,
    params: &ProtocolParameters,
) -> Result<f64, ProtocolError> {
    if number_of_operations == 0 {
        return Err(ProtocolError::OperationCountNotPositive);
    }

    let fee_per_operation =
        normalized_fee as f64 * params.normalized_fee_to_per_operation_fee_multiplier;
    let fee_for_all_operations = fee_per_operation * number_of_operations as f64;

    Ok(fee_for_all_operations.max(normalized_fee as f64))
}

/// Fails if `fee_paid` is below the minimum for the declared operation count
pub fn verify_transaction_fee(
    fee_paid: u64,
    number_of_operations: u32,
    normalized_fee: u64,
    params: &ProtocolParameters,
) -> Result<(), ProtocolError> {
    let required = compute_minimum_transaction_fee(normalized_fee, number_of_operations, params)?;

    if (fee_paid as f64) < required {
        return Err(ProtocolError::TransactionFeePaidInvalid {
            paid: fee_paid,
            required: required.ceil() as u64,
        });
    }

    Ok(())
}
