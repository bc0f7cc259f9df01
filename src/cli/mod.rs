use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::application::{LedgerService, Outcome};
use crate::config::Config;
use crate::domain::{format_cents, AccountId};

/// Coffer - minimal bank ledger
#[derive(Parser)]
#[command(name = "coffer")]
#[command(about = "A minimal bank ledger: accounts, deposits, withdrawals and transfers")]
#[command(version)]
pub struct Cli {
    /// Database file path [default: coffer.db]
    #[arg(short, long, global = true, env = "COFFER_DATABASE")]
    pub database: Option<String>,

    /// JSON settings file
    #[arg(short, long, global = true, env = "COFFER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Open a new account
    Open {
        /// Initial balance (e.g., "100.00" or "100")
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        balance: String,
    },

    /// Deposit money into an account
    Deposit {
        /// Account ID
        account: AccountId,

        /// Amount to deposit
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },

    /// Withdraw money from an account
    Withdraw {
        /// Account ID
        account: AccountId,

        /// Amount to withdraw
        #[arg(allow_negative_numbers = true)]
        amount: String,
    },

    /// Move money between two accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        #[arg(allow_negative_numbers = true)]
        amount: String,

        /// Source account ID
        #[arg(long)]
        from: AccountId,

        /// Destination account ID
        #[arg(long)]
        to: AccountId,
    },

    /// Show the balance of an account
    Balance {
        /// Account ID
        account: AccountId,
    },

    /// List all accounts
    Accounts,

    /// Show the transaction history of an account
    History {
        /// Account ID
        account: AccountId,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = HistoryFormat::Table)]
        format: HistoryFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HistoryFormat {
    Table,
    Csv,
    Json,
}

impl Cli {
    /// Resolve settings: flags and env vars over the settings file over defaults.
    pub fn resolve_config(&self) -> Result<Config> {
        Ok(Config::load(self.config.as_deref())?
            .with_overrides(self.database.clone(), self.verbose))
    }

    pub async fn run(self) -> Result<()> {
        let config = self.resolve_config()?;
        init_tracing(&config.log_level);

        match self.command {
            Commands::Init => {
                LedgerService::init(&config.database).await?;
                println!("Database initialized: {}", config.database);
            }

            Commands::Open { balance } => {
                let service = connect(&config).await?;
                print_outcome(service.create_account(&balance).await?);
            }

            Commands::Deposit { account, amount } => {
                let service = connect(&config).await?;
                print_outcome(service.deposit(account, &amount).await?);
            }

            Commands::Withdraw { account, amount } => {
                let service = connect(&config).await?;
                print_outcome(service.withdraw(account, &amount).await?);
            }

            Commands::Transfer { amount, from, to } => {
                let service = connect(&config).await?;
                print_outcome(service.transfer(from, to, &amount).await?);
            }

            Commands::Balance { account } => {
                let service = connect(&config).await?;
                print_outcome(service.get_balance(account).await?);
            }

            Commands::Accounts => {
                let service = connect(&config).await?;
                run_accounts_command(&service).await?;
            }

            Commands::History {
                account,
                format,
                output,
            } => {
                let service = connect(&config).await?;
                run_history_command(&service, account, format, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn connect(config: &Config) -> Result<LedgerService> {
    LedgerService::connect(&config.database)
        .await
        .with_context(|| {
            format!(
                "Cannot open database '{}' (run `coffer init` first)",
                config.database
            )
        })
}

fn print_outcome(outcome: Outcome) {
    println!("{}", outcome);
}

async fn run_accounts_command(service: &LedgerService) -> Result<()> {
    let accounts = service.list_accounts().await?;
    if accounts.is_empty() {
        println!("No accounts found.");
        return Ok(());
    }

    println!("{:<10} {:>14} {:<12}", "ACCOUNT", "BALANCE", "OPENED");
    println!("{}", "-".repeat(38));
    for account in accounts {
        println!(
            "{:<10} {:>14} {:<12}",
            account.account_id,
            format_cents(account.balance),
            account.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

async fn run_history_command(
    service: &LedgerService,
    account_id: AccountId,
    format: HistoryFormat,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;

    if let Err(err) = service.get_account(account_id).await {
        if let Some(rejection) = err.rejection() {
            print_outcome(Outcome::Cancelled(rejection.clone()));
            return Ok(());
        }
        return Err(err.into());
    }

    let exporter = Exporter::new(service);
    let count = match format {
        HistoryFormat::Table => {
            print_history_table(service, account_id).await?;
            return Ok(());
        }
        HistoryFormat::Csv => {
            exporter
                .export_history_csv(account_id, open_output(output)?)
                .await?
        }
        HistoryFormat::Json => {
            exporter
                .export_history_json(account_id, open_output(output)?)
                .await?
                .transactions
                .len()
        }
    };

    if output.is_some() {
        eprintln!("Exported {} transactions", count);
    }
    Ok(())
}

fn open_output(output: Option<&str>) -> Result<Box<dyn std::io::Write>> {
    use std::fs::File;
    use std::io::stdout;

    Ok(match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    })
}

async fn print_history_table(service: &LedgerService, account_id: AccountId) -> Result<()> {
    let transactions = service.list_transactions(account_id).await?;
    if transactions.is_empty() {
        println!("No transactions for account {}.", account_id);
        return Ok(());
    }

    println!("{:<8} {:<20} {:<10} {:>12}", "ID", "DATE", "TYPE", "AMOUNT");
    println!("{}", "-".repeat(53));
    for tx in transactions {
        println!(
            "{:<8} {:<20} {:<10} {:>12}",
            tx.transaction_id,
            tx.timestamp.format("%Y-%m-%d %H:%M:%S"),
            tx.kind,
            format_cents(tx.amount)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_for(db_path: &str, args: &[&str]) -> Cli {
        let mut argv = vec!["coffer", "-d", db_path];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parses_transfer() {
        let cli = Cli::try_parse_from(["coffer", "transfer", "50.00", "--from", "1", "--to", "2"])
            .unwrap();
        match cli.command {
            Commands::Transfer { amount, from, to } => {
                assert_eq!(amount, "50.00");
                assert_eq!(from, 1);
                assert_eq!(to, 2);
            }
            _ => panic!("expected transfer command"),
        }
    }

    #[test]
    fn test_negative_amount_reaches_the_ledger() {
        // Validation belongs to the ledger, so clap must not reject "-5" as a flag.
        let cli = Cli::try_parse_from(["coffer", "deposit", "1", "--", "-5"]).unwrap();
        assert!(matches!(cli.command, Commands::Deposit { ref amount, .. } if amount == "-5"));
    }

    #[test]
    fn test_open_defaults_to_zero_balance() {
        let cli = Cli::try_parse_from(["coffer", "open"]).unwrap();
        assert!(matches!(cli.command, Commands::Open { ref balance } if balance == "0"));
    }

    #[test]
    fn test_database_flag_overrides_default() {
        let cli = Cli::try_parse_from(["coffer", "-d", "other.db", "-v", "accounts"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.database, "other.db");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_database_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["coffer", "balance", "1", "-d", "other.db"]).unwrap();
        assert_eq!(cli.resolve_config().unwrap().database, "other.db");

        let cli = Cli::try_parse_from(["coffer", "accounts", "-c", "settings.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("settings.json")));
    }

    #[tokio::test]
    async fn test_run_succeeds_for_approved_and_cancelled_outcomes() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("x.db");
        let db_path = db_path.to_str().unwrap();

        cli_for(db_path, &["init"]).run().await?;
        cli_for(db_path, &["open", "--balance", "10"]).run().await?;
        // Cancelled for insufficient funds, which is still a normal exit.
        cli_for(db_path, &["withdraw", "1", "20"]).run().await?;
        cli_for(db_path, &["balance", "42"]).run().await?;
        cli_for(db_path, &["history", "42"]).run().await?;

        let service = LedgerService::connect(db_path).await?;
        assert_eq!(service.get_account(1).await?.balance, 1000);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_fails_without_database() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("missing.db");

        let result = cli_for(db_path.to_str().unwrap(), &["balance", "1"]).run().await;
        assert!(result.is_err());
        assert!(!db_path.exists());
        Ok(())
    }
}
