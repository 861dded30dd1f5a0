use thiserror::Error;

use crate::domain::{Amount, InsufficientFunds, InvalidAccountName};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount - {0}")]
    InvalidAmount(Amount),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(InsufficientFunds),

    #[error("{0}")]
    InvalidAccountName(#[from] InvalidAccountName),

    #[error("Persistence error: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl From<InsufficientFunds> for AppError {
    fn from(err: InsufficientFunds) -> Self {
        AppError::InsufficientFunds(err)
    }
}
