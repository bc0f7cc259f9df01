//! Configuration management
//!
//! Settings come from an optional JSON file:
//! ```json
//! { "database": "bank.db", "logLevel": "debug" }
//! ```
//! Command-line flags (and their environment variables) override the file,
//! and the file overrides the built-in defaults.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DATABASE: &str = "coffer.db";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Raw settings file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the SQLite database file
    pub database: String,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load config from a settings file, or the defaults when no file is given.
    pub fn load(settings_path: Option<&Path>) -> Result<Self> {
        let Some(path) = settings_path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    fn from_json(content: &str) -> Result<Self> {
        let raw: SettingsFile = serde_json::from_str(content)?;
        let defaults = Self::default();
        Ok(Self {
            database: raw.database.unwrap_or(defaults.database),
            log_level: raw.log_level.unwrap_or(defaults.log_level),
        })
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, database: Option<String>, verbose: bool) -> Self {
        if let Some(database) = database {
            self.database = database;
        }
        if verbose {
            self.log_level = "debug".to_string();
        }
        self
    }
}
