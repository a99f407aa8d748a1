//! Marketplace stores and their payout accounts.

use common::AccountNumber;
use serde::{Deserialize, Serialize};

/// Identifier of a marketplace store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(String);

impl StoreId {
    /// Creates a new store ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the store ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for StoreId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for StoreId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A marketplace store.
///
/// Looked up in batch when recomputing cart subtotals; each checkout
/// transfer leg pays into the store's payout account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreFront {
    /// Store identifier.
    pub id: StoreId,

    /// Display name.
    pub name: String,

    /// Ledger account that receives this store's share of a checkout.
    pub payout_account: AccountNumber,
}
