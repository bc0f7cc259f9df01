use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, Sqlite};
use tracing::debug;

use crate::domain::{Account, AccountId, Cents, NewTransaction, Transaction};

use super::repository::{row_to_account, row_to_transaction};

/// An open commit boundary over the store.
///
/// All writes of one ledger operation go through a single scope. Nothing is
/// visible to other readers until [`Scope::commit`]; if the scope is dropped
/// first, the underlying SQLite transaction is rolled back.
pub struct Scope {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl Scope {
    pub(super) fn new(tx: sqlx::Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    /// Fetch an account and hold the database write lock until the scope ends.
    ///
    /// SQLite has no `SELECT ... FOR UPDATE`; a no-op `UPDATE` as the first
    /// write takes the lock (waiting on the busy timeout if another writer has
    /// it), so the balance read below cannot go stale before commit.
    pub async fn get_account_for_update(&mut self, id: AccountId) -> Result<Option<Account>> {
        sqlx::query("UPDATE accounts SET balance_cents = balance_cents WHERE account_id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .context("Failed to lock account")?;

        let row = sqlx::query(
            r#"
            SELECT account_id, balance_cents, created_at
            FROM accounts
            WHERE account_id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Fetch an account without locking it. Reads in the same scope see one
    /// consistent snapshot.
    pub async fn get_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT account_id, balance_cents, created_at
            FROM accounts
            WHERE account_id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// List the transactions recorded on an account, oldest first.
    pub async fn list_transactions_for_account(
        &mut self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT transaction_id, account_id, amount_cents, type, timestamp
            FROM transactions
            WHERE account_id = ?
            ORDER BY transaction_id
            "#,
        )
        .bind(account_id)
        .fetch_all(&mut *self.tx)
        .await
        .context("Failed to list transactions for account")?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// Insert a new account; the store assigns its id.
    pub async fn insert_account(&mut self, balance: Cents) -> Result<Account> {
        let created_at = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (balance_cents, created_at)
            VALUES (?, ?)
            RETURNING account_id
            "#,
        )
        .bind(balance)
        .bind(created_at.to_rfc3339())
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to save account")?;

        Ok(Account {
            account_id: row.get("account_id"),
            balance,
            created_at,
        })
    }

    /// Write the account's balance back.
    pub async fn put_account(&mut self, account: &Account) -> Result<()> {
        let result = sqlx::query("UPDATE accounts SET balance_cents = ? WHERE account_id = ?")
            .bind(account.balance)
            .bind(account.account_id)
            .execute(&mut *self.tx)
            .await
            .context("Failed to update account")?;

        if result.rows_affected() != 1 {
            anyhow::bail!("Account {} vanished during update", account.account_id);
        }
        Ok(())
    }

    /// Append a transaction; the store assigns its id.
    pub async fn insert_transaction(&mut self, pending: NewTransaction) -> Result<Transaction> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (account_id, amount_cents, type, timestamp)
            VALUES (?, ?, ?, ?)
            RETURNING transaction_id
            "#,
        )
        .bind(pending.account_id)
        .bind(pending.amount)
        .bind(pending.kind.as_str())
        .bind(pending.timestamp.to_rfc3339())
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to save transaction")?;

        Ok(pending.into_stored(row.get("transaction_id")))
    }

    /// Make every write of this scope durable at once.
    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit transaction")?;
        debug!("scope committed");
        Ok(())
    }

    /// Discard every write of this scope.
    pub async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back transaction")?;
        debug!("scope rolled back");
        Ok(())
    }
}
