use thiserror::Error;
use tracing::warn;

use super::{parse_cents, Cents, ParseCentsError};

/// Why an amount was refused before reaching the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("'{input}' is not a numeric amount ({source})")]
    NotNumeric {
        input: String,
        source: ParseCentsError,
    },

    #[error("amount {0} is negative")]
    Negative(String),
}

/// Parse and check an amount. Zero is accepted; negatives and anything that
/// does not read as a decimal number are not. Every rejection is logged with
/// the check that failed.
pub fn validate_amount(input: &str) -> Result<Cents, AmountError> {
    let checked = match parse_cents(input) {
        Err(source) => Err(AmountError::NotNumeric {
            input: input.to_string(),
            source,
        }),
        Ok(cents) if cents < 0 => Err(AmountError::Negative(input.trim().to_string())),
        Ok(cents) => Ok(cents),
    };

    if let Err(err) = &checked {
        warn!(amount = input, reason = %err, "rejected amount");
    }
    checked
}

/// Returns true when `input` must be rejected.
pub fn is_incorrect_amount(input: &str) -> bool {
    validate_amount(input).is_err()
}
