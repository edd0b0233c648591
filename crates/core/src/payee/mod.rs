//! Bank account whitelist and the cashless payee check.

pub mod error;
pub mod policy;
pub mod types;

pub use error::PayeeError;
pub use policy::{DEFAULT_CASHLESS_THRESHOLD, PayeePolicy};
pub use types::{BankAccount, VerificationStatus, validate_account_fields};
