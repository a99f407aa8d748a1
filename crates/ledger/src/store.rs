use async_trait::async_trait;
use common::{AccountNumber, Money, NationalId};

use crate::types::{Account, Movement, User};
use crate::Result;

/// Core trait for ledger store implementations.
///
/// All implementations must be thread-safe (Send + Sync). The transfer
/// primitive is atomic: it either fully applies (both balances updated and
/// a movement recorded) or has no effect.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Looks up a client's account by their national ID.
    ///
    /// Returns None if the client has no account.
    async fn get_account(&self, owner: &NationalId) -> Result<Option<Account>>;

    /// Returns the national ID owning an account, or None if the account
    /// does not exist.
    ///
    /// Consumed by the transfer authorization gate, which must run before
    /// any transfer is invoked.
    async fn account_owner(&self, account: &AccountNumber) -> Result<Option<NationalId>>;

    /// Atomically moves `amount` from `source` to `destination`.
    ///
    /// Fails with `InsufficientFunds` when the source balance does not
    /// cover the amount, `InvalidAccount` when either account is missing,
    /// and `InvalidAmount` when the amount is not strictly positive. On
    /// failure no balance changes and no movement is recorded.
    async fn transfer(
        &self,
        source: &AccountNumber,
        destination: &AccountNumber,
        amount: Money,
    ) -> Result<()>;

    /// Returns the most recent movements touching an account, newest
    /// first, up to `limit` rows.
    async fn recent_movements(&self, account: &AccountNumber, limit: i64)
        -> Result<Vec<Movement>>;

    /// Looks up a login user by username.
    async fn find_user(&self, username: &str) -> Result<Option<User>>;
}
