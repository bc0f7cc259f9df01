// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use coffer::application::{LedgerService, Outcome};
use coffer::domain::{AccountId, Cents};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Open an account with the given initial balance and return its id.
/// Ids are assigned in order starting at 1.
pub async fn open_account(service: &LedgerService, balance: &str) -> Result<AccountId> {
    let outcome = service.create_account(balance).await?;
    assert!(outcome.is_approved(), "account creation failed: {}", outcome);
    let accounts = service.list_accounts().await?;
    Ok(accounts.last().unwrap().account_id)
}

/// Current balance in cents.
pub async fn balance_of(service: &LedgerService, account_id: AccountId) -> Result<Cents> {
    Ok(service.get_account(account_id).await?.balance)
}

/// Total number of stored transactions.
pub async fn transaction_count(service: &LedgerService) -> Result<i64> {
    Ok(service.repository().count_transactions().await?)
}

pub fn assert_cancelled(outcome: &Outcome) {
    assert!(outcome.is_cancelled(), "expected cancellation, got: {}", outcome);
}
