//! Explicit confirmation for destructive operations.

use thiserror::Error;

/// Phrase required to clear the audit log.
pub const CLEAR_AUDIT_LOGS_PHRASE: &str = "CLEAR ALL AUDIT LOGS";

/// The confirmation was missing or did not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Confirmation required: send \"{expected}\" to proceed")]
pub struct ConfirmationError {
    /// The value that must be sent back.
    pub expected: String,
}

impl ConfirmationError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        428
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "CONFIRMATION_REQUIRED"
    }
}

/// Requires `given` to equal `expected` exactly (surrounding whitespace ignored).
pub fn require_confirmation(given: Option<&str>, expected: &str) -> Result<(), ConfirmationError> {
    match given {
        Some(value) if value.trim() == expected => Ok(()),
        _ => Err(ConfirmationError {
            expected: expected.to_string(),
        }),
    }
}
