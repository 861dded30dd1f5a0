use std::fmt;

use super::Amount;

/// The balance of a single customer's account. The name it was opened under
/// belongs to the owning ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Account {
    pub balance: Amount,
}

impl Account {
    pub fn new(balance: Amount) -> Self {
        Self { balance }
    }

    /// Add `amount` to the balance. Returns `None` (leaving the balance untouched)
    /// if the result would not fit.
    pub fn credit(&mut self, amount: Amount) -> Option<Amount> {
        self.balance = self.balance.checked_add(amount)?;
        Some(self.balance)
    }

    /// Check that `amount` can be withdrawn without the balance going negative.
    pub fn ensure_funds(&self, amount: Amount) -> Result<(), InsufficientFunds> {
        if amount > self.balance {
            return Err(InsufficientFunds {
                requested: amount,
                balance: self.balance,
            });
        }
        Ok(())
    }

    /// Remove `amount` from the balance. The balance never goes negative.
    pub fn debit(&mut self, amount: Amount) -> Result<Amount, InsufficientFunds> {
        self.ensure_funds(amount)?;
        self.balance -= amount;
        Ok(self.balance)
    }
}

/// `bank-<lowercased name>.dat`
pub fn data_file_name(account_name: &str) -> String {
    format!("bank-{}.dat", account_name.to_lowercase())
}

/// Account names become part of a file name, so they must be non-empty and
/// must not contain path separators or NUL.
pub fn validate_account_name(name: &str) -> Result<(), InvalidAccountName> {
    if name.is_empty() || name.chars().any(|c| std::path::is_separator(c) || c == '\0') {
        return Err(InvalidAccountName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidAccountName(pub String);

impl fmt::Display for InvalidAccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid account name '{}'", self.0)
    }
}

impl std::error::Error for InvalidAccountName {}

/// A withdrawal asked for more than the account holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsufficientFunds {
    pub requested: Amount,
    pub balance: Amount,
}

impl fmt::Display for InsufficientFunds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "withdrawal amount ${} exceeds balance ${}",
            self.requested, self.balance
        )
    }
}

impl std::error::Error for InsufficientFunds {}
