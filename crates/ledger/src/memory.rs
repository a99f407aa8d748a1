use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use common::{AccountNumber, Money, NationalId};

use crate::store::LedgerStore;
use crate::types::{Account, Movement, User};
use crate::{LedgerError, Result};

#[derive(Debug, Default)]
struct InMemoryLedgerState {
    accounts: HashMap<AccountNumber, (NationalId, Money)>,
    users: HashMap<String, User>,
    movements: Vec<Movement>,
    next_movement_id: i64,
    fail_transfers_to: HashSet<AccountNumber>,
    fail_all_transfers: bool,
}

/// In-memory ledger store for testing.
///
/// Provides the same interface as the PostgreSQL implementation, plus
/// failure toggles for exercising the checkout compensation paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<InMemoryLedgerState>>,
}

impl InMemoryLedger {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an account.
    pub fn insert_account(
        &self,
        number: impl Into<AccountNumber>,
        owner: impl Into<NationalId>,
        balance: Money,
    ) {
        self.state
            .write()
            .unwrap()
            .accounts
            .insert(number.into(), (owner.into(), balance));
    }

    /// Inserts or replaces a login user.
    pub fn insert_user(&self, user: User) {
        self.state
            .write()
            .unwrap()
            .users
            .insert(user.username.clone(), user);
    }

    /// Returns the current balance of an account, if it exists.
    pub fn balance(&self, account: &AccountNumber) -> Option<Money> {
        self.state
            .read()
            .unwrap()
            .accounts
            .get(account)
            .map(|(_, balance)| *balance)
    }

    /// Returns the total number of recorded movements.
    pub fn movement_count(&self) -> usize {
        self.state.read().unwrap().movements.len()
    }

    /// Configures transfers into the given destination to fail with a
    /// store error, leaving balances untouched. May be called repeatedly
    /// to fail several destinations.
    pub fn set_fail_transfers_to(&self, destination: impl Into<AccountNumber>) {
        self.state
            .write()
            .unwrap()
            .fail_transfers_to
            .insert(destination.into());
    }

    /// Configures every transfer to fail with a store error.
    pub fn set_fail_all_transfers(&self, fail: bool) {
        self.state.write().unwrap().fail_all_transfers = fail;
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn get_account(&self, owner: &NationalId) -> Result<Option<Account>> {
        let state = self.state.read().unwrap();
        Ok(state
            .accounts
            .iter()
            .find(|(_, (acc_owner, _))| acc_owner == owner)
            .map(|(number, (acc_owner, balance))| Account {
                number: number.clone(),
                owner: acc_owner.clone(),
                balance: *balance,
            }))
    }

    async fn account_owner(&self, account: &AccountNumber) -> Result<Option<NationalId>> {
        let state = self.state.read().unwrap();
        Ok(state.accounts.get(account).map(|(owner, _)| owner.clone()))
    }

    async fn transfer(
        &self,
        source: &AccountNumber,
        destination: &AccountNumber,
        amount: Money,
    ) -> Result<()> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }

        let mut state = self.state.write().unwrap();

        if state.fail_all_transfers {
            return Err(LedgerError::Unavailable(
                "transfer rejected by test toggle".to_string(),
            ));
        }
        if state.fail_transfers_to.contains(destination) {
            return Err(LedgerError::Unavailable(format!(
                "transfer to {destination} rejected by test toggle"
            )));
        }

        let source_balance = state
            .accounts
            .get(source)
            .ok_or_else(|| LedgerError::InvalidAccount(source.clone()))?
            .1;
        if !state.accounts.contains_key(destination) {
            return Err(LedgerError::InvalidAccount(destination.clone()));
        }

        if source_balance < amount {
            return Err(LedgerError::InsufficientFunds {
                account: source.clone(),
                requested: amount,
            });
        }

        // Both sides validated; apply the mutation as one unit.
        state.accounts.get_mut(source).unwrap().1 -= amount;
        state.accounts.get_mut(destination).unwrap().1 += amount;

        state.next_movement_id += 1;
        let movement = Movement {
            id: state.next_movement_id,
            source: source.clone(),
            destination: destination.clone(),
            amount,
            executed_at: Utc::now(),
        };
        state.movements.push(movement);

        Ok(())
    }

    async fn recent_movements(
        &self,
        account: &AccountNumber,
        limit: i64,
    ) -> Result<Vec<Movement>> {
        let state = self.state.read().unwrap();
        Ok(state
            .movements
            .iter()
            .rev()
            .filter(|m| &m.source == account || &m.destination == account)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().unwrap();
        Ok(state.users.get(username).cloned())
    }
}
