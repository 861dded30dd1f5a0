use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of random digits following the kind prefix of a transaction ID.
pub const TRANSACTION_ID_DIGITS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

impl TransactionKind {
    pub fn prefix(&self) -> char {
        match self {
            TransactionKind::Deposit => 'D',
            TransactionKind::Withdrawal => 'W',
        }
    }

    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            'D' => Some(TransactionKind::Deposit),
            'W' => Some(TransactionKind::Withdrawal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque identifier returned for every successful (or deduplicated) mutation.
///
/// Generated IDs are the kind prefix followed by [`TRANSACTION_ID_DIGITS`] random
/// digits, e.g. `D0412598833`. Uniqueness only matters within one process lifetime,
/// so collisions are possible but not checked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn generate(kind: TransactionKind) -> Self {
        let mut rng = rand::thread_rng();
        let mut id = String::with_capacity(TRANSACTION_ID_DIGITS + 1);
        id.push(kind.prefix());
        for _ in 0..TRANSACTION_ID_DIGITS {
            id.push(char::from(b'0' + rng.gen_range(0..10u8)));
        }
        Self(id)
    }

    /// The kind encoded in the prefix, if it is one we recognise.
    pub fn kind(&self) -> Option<TransactionKind> {
        self.0.chars().next().and_then(TransactionKind::from_prefix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TransactionId {
    type Err = ParseTransactionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(ParseTransactionIdError(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTransactionIdError(String);

impl fmt::Display for ParseTransactionIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transaction id: '{}'", self.0)
    }
}

impl std::error::Error for ParseTransactionIdError {}
