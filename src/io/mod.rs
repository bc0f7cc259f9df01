// Export of ledger data for use outside the tool.

pub mod export;

pub use export::*;
