use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

pub type TransactionId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money credited to the account
    Deposit,
    /// Money debited from the account
    Withdraw,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(TransactionKind::Deposit),
            "withdraw" => Some(TransactionKind::Withdraw),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded movement of money on a single account.
/// Transactions are append-only: never updated or deleted once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    /// Amount in cents (always positive)
    pub amount: Cents,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
}

/// A transaction that has not been stored yet. The id is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub amount: Cents,
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(account_id: AccountId, amount: Cents, kind: TransactionKind) -> Self {
        assert!(amount > 0, "Transaction amount must be positive");
        Self {
            account_id,
            amount,
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn deposit(account_id: AccountId, amount: Cents) -> Self {
        Self::new(account_id, amount, TransactionKind::Deposit)
    }

    pub fn withdraw(account_id: AccountId, amount: Cents) -> Self {
        Self::new(account_id, amount, TransactionKind::Withdraw)
    }

    pub fn into_stored(self, transaction_id: TransactionId) -> Transaction {
        Transaction {
            transaction_id,
            account_id: self.account_id,
            amount: self.amount,
            kind: self.kind,
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [TransactionKind::Deposit, TransactionKind::Withdraw] {
            assert_eq!(TransactionKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(TransactionKind::from_str("refund"), None);
    }

    #[test]
    fn test_into_stored_keeps_fields() {
        let pending = NewTransaction::withdraw(7, 2500);
        let timestamp = pending.timestamp;
        let stored = pending.into_stored(42);

        assert_eq!(stored.transaction_id, 42);
        assert_eq!(stored.account_id, 7);
        assert_eq!(stored.amount, 2500);
        assert_eq!(stored.kind, TransactionKind::Withdraw);
        assert_eq!(stored.timestamp, timestamp);
    }

    #[test]
    fn test_serializes_kind_as_type() {
        let stored = NewTransaction::deposit(1, 100).into_stored(1);
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["type"], "deposit");
    }

    #[test]
    #[should_panic(expected = "Transaction amount must be positive")]
    fn test_transaction_requires_positive_amount() {
        NewTransaction::deposit(1, 0);
    }
}
