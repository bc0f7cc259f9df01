use std::fmt;

use super::Rejection;

/// What a ledger operation reports back: an approval message, or the reason
/// the operation was cancelled. `Display` renders the outcome message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Approved(String),
    Cancelled(Rejection),
}

impl Outcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, Outcome::Approved(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Approved(_) => None,
            Outcome::Cancelled(rejection) => Some(rejection),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Approved(message) => write!(f, "{}", message),
            Outcome::Cancelled(rejection) => write!(f, "Operation cancelled: {}", rejection),
        }
    }
}
