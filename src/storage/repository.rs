use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::{Account, AccountId, Transaction, TransactionKind};

use super::{Scope, MIGRATION_001_INITIAL};

/// Repository for persisting and querying accounts and transactions.
///
/// Reads go straight to the pool. Every write goes through a [`Scope`]
/// obtained from [`Repository::begin`].
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they don't exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Open a commit boundary. Dropping the scope without
    /// [`Scope::commit`] discards every write made through it.
    pub async fn begin(&self) -> Result<Scope> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        debug!("scope opened");
        Ok(Scope::new(tx))
    }

    // ========================
    // Account queries
    // ========================

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT account_id, balance_cents, created_at
            FROM accounts
            WHERE account_id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// List all accounts ordered by id.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            "SELECT account_id, balance_cents, created_at FROM accounts ORDER BY account_id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(row_to_account).collect()
    }

    // ========================
    // Transaction queries
    // ========================

    /// List the transactions recorded on an account, oldest first.
    pub async fn list_transactions_for_account(
        &self,
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
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions for account")?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// Total number of transactions in the ledger.
    pub async fn count_transactions(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM transactions")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions")?;

        Ok(row.get("count"))
    }
}

pub(super) fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
    let created_at_str: String = row.get("created_at");

    Ok(Account {
        account_id: row.get("account_id"),
        balance: row.get("balance_cents"),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .context("Invalid created_at timestamp")?
            .with_timezone(&Utc),
    })
}

pub(super) fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
    let kind_str: String = row.get("type");
    let timestamp_str: String = row.get("timestamp");

    Ok(Transaction {
        transaction_id: row.get("transaction_id"),
        account_id: row.get("account_id"),
        amount: row.get("amount_cents"),
        kind: TransactionKind::from_str(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid transaction type: {}", kind_str))?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
            .context("Invalid timestamp")?
            .with_timezone(&Utc),
    })
}
