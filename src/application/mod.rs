// Application layer - ledger operations and the outcomes they report.

pub mod error;
pub mod outcome;
mod service;

pub use error::*;
pub use outcome::*;
pub use service::*;
