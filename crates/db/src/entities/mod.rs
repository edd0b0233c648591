//! `SeaORM` entity definitions.
//!
//! Enumerated columns are stored as constrained text and parsed into the
//! `rimba-core` enums by the repositories.

pub mod approval_actions;
pub mod approval_requests;
pub mod approval_workflows;
pub mod audit_logs;
pub mod bank_accounts;
pub mod financial_transactions;
pub mod profiles;
pub mod spending_limits;
