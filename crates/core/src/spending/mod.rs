//! Spending limit evaluation.
//!
//! # Modules
//!
//! - `types` - Limits, ledgers, transaction proposals and history
//! - `window` - Calendar periods for periodic limits
//! - `evaluator` - Limit matching and violation detection
//! - `error` - Spending-specific error types

pub mod error;
pub mod evaluator;
pub mod types;
pub mod window;

#[cfg(test)]
mod evaluator_props;

pub use error::SpendingError;
pub use evaluator::{LimitViolation, SpendingCheck, SpendingEvaluator};
pub use types::{
    LedgerScope, LedgerType, LimitType, PriorTransaction, SpendingLimit, TransactionProposal,
    TransactionStatus, validate_limit_amount,
};
pub use window::{AggregationCalendar, Period};
