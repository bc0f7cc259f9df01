use tracing::{info, warn};

use crate::domain::{
    format_cents, validate_amount, Account, AccountId, Cents, NewTransaction, Transaction,
};
use crate::storage::Repository;

use super::{AppError, Outcome, Rejection};

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, tests, embedding code).
///
/// Mutating operations run inside one store scope each: the account rows they
/// touch are locked before the funds check, and the balance updates and
/// transaction inserts are committed together or not at all.
pub struct LedgerService {
    repo: Repository,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a database at the given path, creating the file and tables
    /// if needed.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Mutating operations
    // ========================

    /// Open a new account holding `initial_balance` ("0" for an empty one).
    pub async fn create_account(&self, initial_balance: &str) -> Result<Outcome, AppError> {
        settle("create_account", self.try_create_account(initial_balance).await)
    }

    /// Credit `amount` to an account and record a deposit transaction.
    pub async fn deposit(&self, account_id: AccountId, amount: &str) -> Result<Outcome, AppError> {
        settle("deposit", self.try_deposit(account_id, amount).await)
    }

    /// Debit `amount` from an account and record a withdraw transaction.
    /// Cancelled when the balance does not cover the amount.
    pub async fn withdraw(&self, account_id: AccountId, amount: &str) -> Result<Outcome, AppError> {
        settle("withdraw", self.try_withdraw(account_id, amount).await)
    }

    /// Move `amount` between two accounts, recording a withdraw on the source
    /// and a deposit on the destination. Either both sides are written or
    /// neither is.
    pub async fn transfer(
        &self,
        from_id: AccountId,
        to_id: AccountId,
        amount: &str,
    ) -> Result<Outcome, AppError> {
        settle("transfer", self.try_transfer(from_id, to_id, amount).await)
    }

    // ========================
    // Queries
    // ========================

    /// Report the balance of an account.
    pub async fn get_balance(&self, account_id: AccountId) -> Result<Outcome, AppError> {
        settle("get_balance", self.try_get_balance(account_id).await)
    }

    /// Get an account by id.
    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(account_id)
            .await?
            .ok_or(AppError::Rejected(Rejection::AccountNotFound(account_id)))
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    /// Transaction history of an account, oldest first.
    pub async fn list_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, AppError> {
        let account = self.get_account(account_id).await?;
        Ok(self
            .repo
            .list_transactions_for_account(account.account_id)
            .await?)
    }

    /// An account together with its transaction history, read from one
    /// snapshot so the balance always matches the listed transactions.
    pub async fn account_history(
        &self,
        account_id: AccountId,
    ) -> Result<(Account, Vec<Transaction>), AppError> {
        let mut scope = self.repo.begin().await?;
        let account = scope
            .get_account(account_id)
            .await?
            .ok_or(Rejection::AccountNotFound(account_id))?;
        let transactions = scope.list_transactions_for_account(account_id).await?;
        scope.rollback().await?;
        Ok((account, transactions))
    }

    // ========================
    // Operation bodies
    // ========================

    async fn try_create_account(&self, initial_balance: &str) -> Result<String, AppError> {
        let balance = validate_amount(initial_balance).map_err(Rejection::from)?;

        let mut scope = self.repo.begin().await?;
        let account = scope.insert_account(balance).await?;
        scope.commit().await?;

        Ok(format!(
            "Account {} created with a balance of {}",
            account.account_id,
            format_cents(account.balance)
        ))
    }

    async fn try_deposit(&self, account_id: AccountId, amount: &str) -> Result<String, AppError> {
        let amount = movement_amount(amount)?;

        let mut scope = self.repo.begin().await?;
        let mut account = scope
            .get_account_for_update(account_id)
            .await?
            .ok_or(Rejection::AccountNotFound(account_id))?;

        account.balance = account
            .credited(amount)
            .ok_or_else(|| overflow(amount, account_id))?;
        scope.put_account(&account).await?;
        let transaction = scope
            .insert_transaction(NewTransaction::deposit(account_id, amount))
            .await?;
        scope.commit().await?;

        Ok(format!(
            "Deposit of {} on account {} approved (transaction {}); new balance {}",
            format_cents(amount),
            account_id,
            transaction.transaction_id,
            format_cents(account.balance)
        ))
    }

    async fn try_withdraw(&self, account_id: AccountId, amount: &str) -> Result<String, AppError> {
        let amount = movement_amount(amount)?;

        let mut scope = self.repo.begin().await?;
        let mut account = scope
            .get_account_for_update(account_id)
            .await?
            .ok_or(Rejection::AccountNotFound(account_id))?;

        if !account.has_funds_for(amount) {
            return Err(insufficient(&account, amount).into());
        }

        account.balance -= amount;
        scope.put_account(&account).await?;
        let transaction = scope
            .insert_transaction(NewTransaction::withdraw(account_id, amount))
            .await?;
        scope.commit().await?;

        Ok(format!(
            "Withdrawal of {} from account {} approved (transaction {}); new balance {}",
            format_cents(amount),
            account_id,
            transaction.transaction_id,
            format_cents(account.balance)
        ))
    }

    async fn try_transfer(
        &self,
        from_id: AccountId,
        to_id: AccountId,
        amount: &str,
    ) -> Result<String, AppError> {
        let amount = movement_amount(amount)?;
        if from_id == to_id {
            return Err(Rejection::SameAccount(from_id).into());
        }

        let mut scope = self.repo.begin().await?;
        let mut source = scope
            .get_account_for_update(from_id)
            .await?
            .ok_or(Rejection::AccountNotFound(from_id))?;

        if !source.has_funds_for(amount) {
            return Err(insufficient(&source, amount).into());
        }

        let mut destination = scope
            .get_account_for_update(to_id)
            .await?
            .ok_or(Rejection::AccountNotFound(to_id))?;

        destination.balance = destination
            .credited(amount)
            .ok_or_else(|| overflow(amount, to_id))?;
        source.balance -= amount;

        scope.put_account(&source).await?;
        scope.put_account(&destination).await?;
        let withdrawal = scope
            .insert_transaction(NewTransaction::withdraw(from_id, amount))
            .await?;
        let deposit = scope
            .insert_transaction(NewTransaction::deposit(to_id, amount))
            .await?;
        scope.commit().await?;

        Ok(format!(
            "Transfer of {} from account {} to account {} approved (transactions {} and {})",
            format_cents(amount),
            from_id,
            to_id,
            withdrawal.transaction_id,
            deposit.transaction_id
        ))
    }

    async fn try_get_balance(&self, account_id: AccountId) -> Result<String, AppError> {
        let account = self.get_account(account_id).await?;
        Ok(format!(
            "Account {} has a balance of {}",
            account.account_id,
            format_cents(account.balance)
        ))
    }
}

/// Turn an operation result into an outcome: rejections become cancellations,
/// storage failures stay errors.
fn settle(operation: &'static str, result: Result<String, AppError>) -> Result<Outcome, AppError> {
    match result {
        Ok(message) => {
            info!(operation, "{}", message);
            Ok(Outcome::Approved(message))
        }
        Err(AppError::Rejected(rejection)) => {
            warn!(operation, reason = %rejection, "operation cancelled");
            Ok(Outcome::Cancelled(rejection))
        }
        Err(err) => Err(err),
    }
}

/// Amount for a deposit, withdrawal or transfer: valid and above zero, since
/// every stored transaction carries a positive amount.
fn movement_amount(input: &str) -> Result<Cents, Rejection> {
    let amount = validate_amount(input)?;
    if amount == 0 {
        return Err(Rejection::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(amount)
}

fn insufficient(account: &Account, required: Cents) -> Rejection {
    Rejection::InsufficientFunds {
        account_id: account.account_id,
        balance: account.balance,
        required,
    }
}

fn overflow(amount: Cents, account_id: AccountId) -> Rejection {
    Rejection::InvalidAmount(format!(
        "crediting {} would overflow the balance of account {}",
        format_cents(amount),
        account_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_amount_rejects_zero() {
        assert_eq!(
            movement_amount("0.00"),
            Err(Rejection::InvalidAmount(
                "amount must be greater than zero".into()
            ))
        );
        assert_eq!(movement_amount("0.01"), Ok(1));
    }

    #[test]
    fn test_settle_keeps_database_errors() {
        let err = settle("deposit", Err(anyhow::anyhow!("connection lost").into()));
        assert!(matches!(err, Err(AppError::Database(_))));
    }

    #[test]
    fn test_settle_turns_rejections_into_cancellations() {
        let outcome = settle("withdraw", Err(Rejection::AccountNotFound(4).into())).unwrap();
        assert_eq!(outcome, Outcome::Cancelled(Rejection::AccountNotFound(4)));
    }
}
