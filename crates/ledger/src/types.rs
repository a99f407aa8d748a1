use chrono::{DateTime, Utc};
use common::{AccountNumber, Money, NationalId};
use serde::{Deserialize, Serialize};

/// A bank account row.
///
/// Owned by exactly one identity; the balance is mutated only via the
/// ledger's transfer primitive and is never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account number.
    pub number: AccountNumber,

    /// National ID of the owning client.
    pub owner: NationalId,

    /// Current balance.
    pub balance: Money,
}

/// A historical ledger movement touching an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Movement row ID.
    pub id: i64,

    /// Debited account.
    pub source: AccountNumber,

    /// Credited account.
    pub destination: AccountNumber,

    /// Amount moved.
    pub amount: Money,

    /// When the transfer executed.
    pub executed_at: DateTime<Utc>,
}

/// A login user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Login name.
    pub username: String,

    /// Argon2 hash of the password.
    pub password_hash: String,

    /// National ID linking the user to their client record and account.
    pub national_id: NationalId,

    /// First name of the client.
    pub first_name: String,

    /// Last name of the client.
    pub last_name: String,
}
