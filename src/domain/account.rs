use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{format_cents, Cents};

/// Store-assigned account identifier.
pub type AccountId = i64;

/// A bank account. Its id is assigned by the store on insert and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    /// Current balance in cents
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn has_funds_for(&self, amount: Cents) -> bool {
        self.balance >= amount
    }

    /// Balance after crediting `amount`, or None on overflow.
    pub fn credited(&self, amount: Cents) -> Option<Cents> {
        self.balance.checked_add(amount)
    }

    /// Balance after debiting `amount`, or None on overflow.
    pub fn debited(&self, amount: Cents) -> Option<Cents> {
        self.balance.checked_sub(amount)
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Account(id={}, balance={})",
            self.account_id,
            format_cents(self.balance)
        )
    }
}
