//! Anchor string codec
//!
//! Wire format: `<numberOfOperations>.<coreIndexFileUri>`, where the count is a
//! positive decimal integer without leading zeros.

use super::error::ProtocolError;

const DELIMITER: char = '.';

/// Data written to the ledger for one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchoredData {
    pub number_of_operations: u32,
    pub core_index_file_uri: String,
}

impl AnchoredData {
    pub fn new(number_of_operations: u32, core_index_file_uri: impl Into<String>) -> Self {
        Self {
            number_of_operations,
            core_index_file_uri: core_index_file_uri.into(),
        }
    }

    /// Encode as an anchor string
    pub fn serialize(&self) -> String {
        format!(
            "{}{}{}",
            self.number_of_operations, DELIMITER, self.core_index_file_uri
        )
    }

    /// Decode an anchor string, rejecting counts above `max_operations_per_batch`
    pub fn deserialize(
        anchor_string: &str,
        max_operations_per_batch: u32,
    ) -> Result<Self, ProtocolError> {
        let parts: Vec<&str> = anchor_string.split(DELIMITER).collect();
        if parts.len() != 2 || parts[1].is_empty() {
            return Err(ProtocolError::AnchoredDataIncorrectFormat(
                anchor_string.to_string(),
            ));
        }

        let number_of_operations = parse_positive_integer(parts[0], max_operations_per_batch)?;

        Ok(Self {
            number_of_operations,
            core_index_file_uri: parts[1].to_string(),
        })
    }
}

fn parse_positive_integer(input: &str, max: u32) -> Result<u32, ProtocolError> {
    let digits = input.strip_prefix('-').unwrap_or(input);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::AnchoredDataNumberOfOperationsNotPositiveInteger(
            input.to_string(),
        ));
    }

    // Negative numbers and any spelling of zero
    if input.starts_with('-') || digits.bytes().all(|b| b == b'0') {
        return Err(ProtocolError::AnchoredDataNumberOfOperationsNotPositiveInteger(
            input.to_string(),
        ));
    }

    if digits.starts_with('0') {
        return Err(ProtocolError::AnchoredDataNumberOfOperationsHasLeadingZero(
            input.to_string(),
        ));
    }

    let too_large = || ProtocolError::AnchoredDataNumberOfOperationsGreaterThanMax {
        count: input.to_string(),
        max,
    };

    let count: u32 = digits.parse().map_err(|_| too_large())?;
    if count > max {
        return Err(too_large());
    }

    Ok(count)
}
