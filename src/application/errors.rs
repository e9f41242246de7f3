//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Currency ledger errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Currency {0} already exists")]
    DuplicateCurrency(String),

    #[error("Currency {0} not found")]
    CurrencyNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<LedgerError> for BotError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Storage(e) => BotError::Storage(e),
            other => BotError::Internal(other.to_string()),
        }
    }
}

/// Non-numeric or non-positive rate/amount input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0} is not a valid positive number")]
pub struct InvalidNumber(pub String);

/// Degenerate or non-positive triangle side lengths.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid side lengths for a triangle")]
pub struct InvalidTriangle;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
