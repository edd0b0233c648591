//! Payee verification error types.

use rust_decimal::Decimal;
use thiserror::Error;

use rimba_shared::types::BankAccountId;

use crate::payee::types::VerificationStatus;

/// Errors raised by the bank account whitelist.
#[derive(Debug, Clone, Error)]
pub enum PayeeError {
    /// Attempted a transition the state machine does not allow.
    #[error("Invalid verification transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: VerificationStatus,
        /// The attempted target status.
        to: VerificationStatus,
    },

    /// Unknown verification status string.
    #[error("Unknown verification status: {0}")]
    UnknownStatus(String),

    /// A required account field is missing.
    #[error("Invalid bank account: {0}")]
    InvalidAccount(String),

    /// The named payee does not exist.
    #[error("Payee account {0} not found")]
    PayeeNotFound(BankAccountId),

    /// The transaction is above the cashless threshold and names no payee.
    #[error("Amounts above {threshold} require a verified payee account")]
    PayeeRequired {
        /// The configured threshold.
        threshold: Decimal,
    },

    /// The payee is not verified or not active.
    #[error("Payee account {account_id} is not usable (status {status}, active: {is_active}); amounts above {threshold} require a verified, active account")]
    PayeeNotVerified {
        /// The payee.
        account_id: BankAccountId,
        /// Its verification status.
        status: VerificationStatus,
        /// Whether it is active.
        is_active: bool,
        /// The configured threshold.
        threshold: Decimal,
    },
}

impl PayeeError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::UnknownStatus(_) | Self::InvalidAccount(_) => 400,
            Self::PayeeNotFound(_) => 404,
            Self::InvalidTransition { .. }
            | Self::PayeeRequired { .. }
            | Self::PayeeNotVerified { .. } => 422,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_VERIFICATION_TRANSITION",
            Self::UnknownStatus(_) => "UNKNOWN_VERIFICATION_STATUS",
            Self::InvalidAccount(_) => "INVALID_BANK_ACCOUNT",
            Self::PayeeNotFound(_) => "PAYEE_NOT_FOUND",
            Self::PayeeRequired { .. } => "PAYEE_REQUIRED",
            Self::PayeeNotVerified { .. } => "PAYEE_NOT_VERIFIED",
        }
    }
}
