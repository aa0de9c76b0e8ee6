pub mod account_type;
pub mod limit;
pub mod transaction;

pub use account_type::AccountType;
pub use limit::{TransactionLimit, Usage, UsageWindow};
pub use transaction::{ProcessingState, Transaction, TransactionStatus, TransactionType};
