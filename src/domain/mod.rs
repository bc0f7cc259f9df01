mod account;
mod money;
mod transaction;
mod validation;

pub use account::*;
pub use money::*;
pub use transaction::*;
pub use validation::*;
