//! Spending limit domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use rimba_shared::types::{BankAccountId, Currency, Money, SpendingLimitId, UserId};

use crate::access::{AccessContext, Role};
use crate::spending::error::SpendingError;

/// The ledger a transaction is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerType {
    /// Operational ledger.
    Operasional,
    /// Project ledger.
    Proyek,
}

impl LedgerType {
    /// Returns the string representation of the ledger.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Operasional => "OPERASIONAL",
            Self::Proyek => "PROYEK",
        }
    }

    /// Parses a ledger type (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OPERASIONAL" => Some(Self::Operasional),
            "PROYEK" => Some(Self::Proyek),
            _ => None,
        }
    }
}

impl fmt::Display for LedgerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerType {
    type Err = SpendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| SpendingError::UnknownLedgerType(s.to_string()))
    }
}

/// The ledgers a limit or workflow row applies to.
///
/// A missing (null) scope on a stored row means [`LedgerScope::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerScope {
    /// Operational ledger only.
    Operasional,
    /// Project ledger only.
    Proyek,
    /// Every ledger.
    #[default]
    All,
}

impl LedgerScope {
    /// Resolves a nullable stored scope.
    #[must_use]
    pub fn resolve(stored: Option<Self>) -> Self {
        stored.unwrap_or(Self::All)
    }

    /// Whether the scope includes the given ledger.
    #[must_use]
    pub const fn covers(self, ledger: LedgerType) -> bool {
        matches!(
            (self, ledger),
            (Self::All, _)
                | (Self::Operasional, LedgerType::Operasional)
                | (Self::Proyek, LedgerType::Proyek)
        )
    }

    /// Returns the string representation of the scope.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Operasional => "OPERASIONAL",
            Self::Proyek => "PROYEK",
            Self::All => "ALL",
        }
    }

    /// Parses a scope (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "OPERASIONAL" => Some(Self::Operasional),
            "PROYEK" => Some(Self::Proyek),
            "ALL" => Some(Self::All),
            _ => None,
        }
    }
}

impl From<LedgerType> for LedgerScope {
    fn from(ledger: LedgerType) -> Self {
        match ledger {
            LedgerType::Operasional => Self::Operasional,
            LedgerType::Proyek => Self::Proyek,
        }
    }
}

impl fmt::Display for LedgerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerScope {
    type Err = SpendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| SpendingError::UnknownLedgerType(s.to_string()))
    }
}

/// How a limit aggregates spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitType {
    /// Caps a single transaction.
    PerTransaction,
    /// Caps the total within a calendar day.
    Daily,
    /// Caps the total within a calendar month.
    Monthly,
    /// Caps the total within a calendar year.
    Annual,
}

impl LimitType {
    /// Every limit type.
    pub const ALL: [Self; 4] = [Self::PerTransaction, Self::Daily, Self::Monthly, Self::Annual];

    /// Returns the string representation of the limit type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerTransaction => "PER_TRANSACTION",
            Self::Daily => "DAILY",
            Self::Monthly => "MONTHLY",
            Self::Annual => "ANNUAL",
        }
    }

    /// Parses a limit type (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == needle)
    }

    /// Whether the limit sums over a calendar period.
    #[must_use]
    pub const fn is_periodic(&self) -> bool {
        !matches!(self, Self::PerTransaction)
    }
}

impl fmt::Display for LimitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LimitType {
    type Err = SpendingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| SpendingError::UnknownLimitType(s.to_string()))
    }
}

/// A declarative spending limit row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingLimit {
    /// Limit ID.
    pub id: SpendingLimitId,
    /// Role the limit applies to.
    pub role: Role,
    /// Aggregation type.
    pub limit_type: LimitType,
    /// Ledger scope; `None` means every ledger.
    pub ledger_type: Option<LedgerScope>,
    /// Maximum amount (inclusive).
    pub limit_amount: Decimal,
    /// Currency of `limit_amount`.
    pub currency: Currency,
    /// Inactive limits are ignored.
    pub is_active: bool,
}

impl SpendingLimit {
    /// The effective ledger scope.
    #[must_use]
    pub fn scope(&self) -> LedgerScope {
        LedgerScope::resolve(self.ledger_type)
    }

    /// Whether this row constrains a transaction by `role` on `ledger` in `currency`.
    #[must_use]
    pub fn applies_to(&self, role: Role, ledger: LedgerType, currency: Currency) -> bool {
        self.is_active
            && self.role == role
            && self.currency == currency
            && self.scope().covers(ledger)
    }

    /// Returns a copy with `is_active` flipped.
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self {
            is_active: !self.is_active,
            ..self.clone()
        }
    }
}

/// Validates a limit amount before it is stored.
///
/// # Errors
///
/// Returns `SpendingError::NegativeLimit` for amounts below zero.
pub fn validate_limit_amount(amount: Decimal) -> Result<(), SpendingError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(SpendingError::NegativeLimit(amount));
    }
    Ok(())
}

/// Lifecycle status of a financial transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Booked without further approval.
    Approved,
    /// Waiting on an approval request.
    PendingApproval,
    /// Refused by policy or by an approver.
    Rejected,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::PendingApproval => "PENDING_APPROVAL",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a status (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "APPROVED" => Some(Self::Approved),
            "PENDING_APPROVAL" => Some(Self::PendingApproval),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether transactions in this status count toward periodic limits.
    #[must_use]
    pub const fn counts_toward_limits(&self) -> bool {
        matches!(self, Self::Approved | Self::PendingApproval)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction someone wants to book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionProposal {
    /// Who is booking it.
    pub actor: AccessContext,
    /// Target ledger.
    pub ledger_type: LedgerType,
    /// Amount and currency.
    pub amount: Money,
    /// Payee account, if any.
    pub payee_account_id: Option<BankAccountId>,
    /// Server time the proposal was received. Periodic limits are cut
    /// from this instant, never from a client-supplied date.
    pub submitted_at: DateTime<Utc>,
}

impl TransactionProposal {
    /// Validates the proposal's amount.
    ///
    /// # Errors
    ///
    /// Returns `SpendingError::NonPositiveAmount` unless the amount is above zero.
    pub fn validate(&self) -> Result<(), SpendingError> {
        if !self.amount.is_positive() {
            return Err(SpendingError::NonPositiveAmount(self.amount.amount));
        }
        Ok(())
    }
}

/// An already-booked transaction, as seen by periodic limit checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorTransaction {
    /// Who booked it.
    pub created_by: UserId,
    /// Ledger it was booked against.
    pub ledger_type: LedgerType,
    /// Amount and currency.
    pub amount: Money,
    /// Current status.
    pub status: TransactionStatus,
    /// Server time it was recorded.
    pub recorded_at: DateTime<Utc>,
}
