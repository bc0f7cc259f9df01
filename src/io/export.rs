use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{format_cents, Account, AccountId, Transaction};

/// Account history snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub account: Account,
    pub transactions: Vec<Transaction>,
}

/// Exporter for writing an account's transaction history in various formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export an account's transactions to CSV format
    pub async fn export_history_csv<W: Write>(
        &self,
        account_id: AccountId,
        writer: W,
    ) -> Result<usize> {
        let transactions = self.service.list_transactions(account_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "transaction_id",
            "account_id",
            "type",
            "amount",
            "amount_cents",
            "timestamp",
        ])?;

        for tx in &transactions {
            csv_writer.write_record(&[
                tx.transaction_id.to_string(),
                tx.account_id.to_string(),
                tx.kind.as_str().to_string(),
                format_cents(tx.amount),
                tx.amount.to_string(),
                tx.timestamp.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(transactions.len())
    }

    /// Export an account and its transactions as a JSON snapshot
    pub async fn export_history_json<W: Write>(
        &self,
        account_id: AccountId,
        mut writer: W,
    ) -> Result<HistorySnapshot> {
        let (account, transactions) = self.service.account_history(account_id).await?;

        let snapshot = HistorySnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            account,
            transactions,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
