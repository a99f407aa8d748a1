use common::{AccountNumber, Money};
use thiserror::Error;

/// Errors that can occur when interacting with the ledger store.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The source account does not cover the requested amount.
    /// Discovered atomically inside the transfer primitive.
    #[error("Insufficient funds in account {account}: requested {requested}")]
    InsufficientFunds {
        account: AccountNumber,
        requested: Money,
    },

    /// Source or destination account does not exist.
    #[error("Invalid account: {0}")]
    InvalidAccount(AccountNumber),

    /// Transfer amounts must be strictly positive.
    #[error("Invalid transfer amount: {0}")]
    InvalidAmount(Money),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The store is unreachable or failed internally.
    #[error("Ledger store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
