use async_trait::async_trait;
use common::{AccountNumber, Money, NationalId};
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::store::LedgerStore;
use crate::types::{Account, Movement, User};
use crate::{LedgerError, Result};

/// PostgreSQL-backed ledger store.
///
/// Connections are pool-scoped: every operation checks a connection out of
/// the pool and returns it on every exit path. Transfers run inside a
/// single transaction with both account rows locked (`FOR UPDATE`) in
/// account-number order, so concurrent transfers touching the same
/// accounts serialize instead of deadlocking.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    fn row_to_movement(row: PgRow) -> Result<Movement> {
        Ok(Movement {
            id: row.try_get("id")?,
            source: AccountNumber::new(row.try_get::<String, _>("source_account")?),
            destination: AccountNumber::new(row.try_get::<String, _>("destination_account")?),
            amount: Money::from_cents(row.try_get("amount_cents")?),
            executed_at: row.try_get("executed_at")?,
        })
    }
}

#[async_trait]
impl LedgerStore for PostgresLedger {
    async fn get_account(&self, owner: &NationalId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT account_number, national_id, balance_cents
            FROM accounts
            WHERE national_id = $1
            "#,
        )
        .bind(owner.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(Account {
                number: AccountNumber::new(row.try_get::<String, _>("account_number")?),
                owner: NationalId::new(row.try_get::<String, _>("national_id")?),
                balance: Money::from_cents(row.try_get("balance_cents")?),
            })
        })
        .transpose()
    }

    async fn account_owner(&self, account: &AccountNumber) -> Result<Option<NationalId>> {
        let row = sqlx::query("SELECT national_id FROM accounts WHERE account_number = $1")
            .bind(account.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Ok(NationalId::new(row.try_get::<String, _>("national_id")?)))
            .transpose()
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

        let mut tx = self.pool.begin().await?;

        // Lock both rows in account-number order to avoid deadlocks
        // between opposing concurrent transfers.
        let mut lock_order = [source, destination];
        lock_order.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for account in lock_order {
            let locked = sqlx::query(
                "SELECT balance_cents FROM accounts WHERE account_number = $1 FOR UPDATE",
            )
            .bind(account.as_str())
            .fetch_optional(&mut *tx)
            .await?;

            if locked.is_none() {
                return Err(LedgerError::InvalidAccount((*account).clone()));
            }
        }

        let source_balance: i64 = sqlx::query_scalar(
            "SELECT balance_cents FROM accounts WHERE account_number = $1",
        )
        .bind(source.as_str())
        .fetch_one(&mut *tx)
        .await?;

        if Money::from_cents(source_balance) < amount {
            return Err(LedgerError::InsufficientFunds {
                account: source.clone(),
                requested: amount,
            });
        }

        sqlx::query(
            "UPDATE accounts SET balance_cents = balance_cents - $1 WHERE account_number = $2",
        )
        .bind(amount.cents())
        .bind(source.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE accounts SET balance_cents = balance_cents + $1 WHERE account_number = $2",
        )
        .bind(amount.cents())
        .bind(destination.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO movements (source_account, destination_account, amount_cents, executed_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(source.as_str())
        .bind(destination.as_str())
        .bind(amount.cents())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(%source, %destination, amount = amount.cents(), "transfer applied");
        Ok(())
    }

    async fn recent_movements(
        &self,
        account: &AccountNumber,
        limit: i64,
    ) -> Result<Vec<Movement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, source_account, destination_account, amount_cents, executed_at
            FROM movements
            WHERE source_account = $1 OR destination_account = $1
            ORDER BY executed_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(account.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_movement).collect()
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT username, password_hash, national_id, first_name, last_name
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(User {
                username: row.try_get("username")?,
                password_hash: row.try_get("password_hash")?,
                national_id: NationalId::new(row.try_get::<String, _>("national_id")?),
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
            })
        })
        .transpose()
    }
}
