//! Transaction policy evaluation.
//!
//! Combines the payee check, spending limits and workflow matching into a
//! single outcome for a proposed transaction.

pub mod evaluator;

#[cfg(test)]
mod evaluator_props;

pub use evaluator::{PolicyInputs, PolicyOutcome, RejectionReason, TransactionPolicy};
