use thiserror::Error;

use crate::domain::{format_cents, AccountId, AmountError, Cents};

/// A request the ledger refuses. Rejections are ordinary outcomes: they are
/// reported to the caller as a cancellation, never as a fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("cannot transfer from account {0} to itself")]
    SameAccount(AccountId),

    #[error("no account with id {0}")]
    AccountNotFound(AccountId),

    #[error(
        "insufficient funds in account {account_id}: balance {}, required {}",
        money(.balance),
        money(.required)
    )]
    InsufficientFunds {
        account_id: AccountId,
        balance: Cents,
        required: Cents,
    },
}

fn money(cents: &Cents) -> String {
    format_cents(*cents)
}

impl From<AmountError> for Rejection {
    fn from(err: AmountError) -> Self {
        Rejection::InvalidAmount(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            AppError::Rejected(rejection) => Some(rejection),
            AppError::Database(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_message() {
        let rejection = Rejection::InsufficientFunds {
            account_id: 3,
            balance: 15000,
            required: 20000,
        };
        assert_eq!(
            rejection.to_string(),
            "insufficient funds in account 3: balance 150.00, required 200.00"
        );
    }

    #[test]
    fn test_amount_error_becomes_invalid_amount() {
        let rejection: Rejection = AmountError::Negative("-5".into()).into();
        assert_eq!(
            rejection,
            Rejection::InvalidAmount("amount -5 is negative".into())
        );
    }

    #[test]
    fn test_database_error_has_no_rejection() {
        let err = AppError::from(anyhow::anyhow!("disk I/O error"));
        assert!(err.rejection().is_none());
        assert_eq!(err.to_string(), "Database error: disk I/O error");
    }
}
