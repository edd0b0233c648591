//! Audit trail and destructive-action confirmation.

pub mod confirm;
pub mod types;

pub use confirm::{CLEAR_AUDIT_LOGS_PHRASE, ConfirmationError, require_confirmation};
pub use types::{AuditAction, AuditEntry, EntityType};
