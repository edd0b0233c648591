//! Spending limit error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while validating or evaluating spending limits.
#[derive(Debug, Clone, Error)]
pub enum SpendingError {
    /// Transactions must move a strictly positive amount.
    #[error("Transaction amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Limit amounts may be zero but never negative.
    #[error("Limit amount must not be negative, got {0}")]
    NegativeLimit(Decimal),

    /// Unknown limit type string.
    #[error("Unknown limit type: {0}")]
    UnknownLimitType(String),

    /// Unknown ledger type string.
    #[error("Unknown ledger type: {0}")]
    UnknownLedgerType(String),

    /// The configured aggregation timezone is not an IANA name.
    #[error("Unknown aggregation timezone: {0}")]
    UnknownTimezone(String),

    /// The period containing the instant cannot be represented.
    #[error("Cannot compute aggregation period for {0}")]
    PeriodUnavailable(String),

    /// Summing period totals overflowed.
    #[error("Spending total overflowed")]
    Overflow,
}

impl SpendingError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NonPositiveAmount(_)
            | Self::NegativeLimit(_)
            | Self::UnknownLimitType(_)
            | Self::UnknownLedgerType(_) => 400,
            Self::Overflow => 422,
            Self::UnknownTimezone(_) | Self::PeriodUnavailable(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::NegativeLimit(_) => "NEGATIVE_LIMIT",
            Self::UnknownLimitType(_) => "UNKNOWN_LIMIT_TYPE",
            Self::UnknownLedgerType(_) => "UNKNOWN_LEDGER_TYPE",
            Self::UnknownTimezone(_) => "UNKNOWN_TIMEZONE",
            Self::PeriodUnavailable(_) => "PERIOD_UNAVAILABLE",
            Self::Overflow => "SPENDING_OVERFLOW",
        }
    }
}
