mod repository;
mod scope;

pub use repository::*;
pub use scope::*;

/// SQL migration for the accounts and transactions tables
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
