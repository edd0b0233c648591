//! Bank account whitelist types and the verification state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use rimba_shared::types::{BankAccountId, UserId};

use crate::payee::error::PayeeError;

/// Verification state of a whitelisted account.
///
/// The valid transitions are:
/// - Pending → Verified, Rejected
/// - Verified → Suspended
/// - Rejected → Verified
/// - Suspended → Verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Awaiting review.
    #[default]
    Pending,
    /// Reviewed and usable as a payee.
    Verified,
    /// Review failed.
    Rejected,
    /// Previously verified, temporarily blocked.
    Suspended,
}

impl VerificationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Verified => "VERIFIED",
            Self::Rejected => "REJECTED",
            Self::Suspended => "SUSPENDED",
        }
    }

    /// Parses a status (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "VERIFIED" => Some(Self::Verified),
            "REJECTED" => Some(Self::Rejected),
            "SUSPENDED" => Some(Self::Suspended),
            _ => None,
        }
    }

    /// Whether the state machine allows moving from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Verified | Self::Rejected)
                | (Self::Verified, Self::Suspended)
                | (Self::Rejected | Self::Suspended, Self::Verified)
        )
    }

    /// Validates a transition and returns the new status.
    pub fn transition(self, to: Self) -> Result<Self, PayeeError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(PayeeError::InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = PayeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| PayeeError::UnknownStatus(s.to_string()))
    }
}

/// A whitelisted payee account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Account ID.
    pub id: BankAccountId,
    /// Account number at the bank.
    pub account_number: String,
    /// Name of the account holder.
    pub account_name: String,
    /// Bank name.
    pub bank_name: String,
    /// Verification status.
    pub verification_status: VerificationStatus,
    /// Reviewer notes from the last verification decision.
    pub verification_notes: Option<String>,
    /// Reviewer of the last verification decision.
    pub verified_by: Option<UserId>,
    /// Time of the last verification decision.
    pub verified_at: Option<DateTime<Utc>>,
    /// Inactive accounts cannot be used as payees.
    pub is_active: bool,
}

impl BankAccount {
    /// Whether the account may receive amounts above the cashless threshold.
    #[must_use]
    pub fn is_usable_payee(&self) -> bool {
        self.is_active && self.verification_status == VerificationStatus::Verified
    }

    /// Applies a verification decision, recording reviewer and time.
    ///
    /// # Errors
    ///
    /// Returns `PayeeError::InvalidTransition` when the state machine forbids it.
    pub fn apply_verification(
        &mut self,
        to: VerificationStatus,
        reviewer: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), PayeeError> {
        self.verification_status = self.verification_status.transition(to)?;
        self.verification_notes = notes;
        self.verified_by = Some(reviewer);
        self.verified_at = Some(now);
        Ok(())
    }

    /// Replaces the identifying fields and returns whether any of them changed.
    ///
    /// A changed account must be reviewed again: the status drops back to
    /// `Pending` and the previous decision is cleared.
    pub fn edit_identity(
        &mut self,
        account_number: Option<&str>,
        account_name: Option<&str>,
        bank_name: Option<&str>,
    ) -> bool {
        let mut changed = false;
        for (field, value) in [
            (&mut self.account_number, account_number),
            (&mut self.account_name, account_name),
            (&mut self.bank_name, bank_name),
        ] {
            if let Some(value) = value.map(str::trim)
                && value != field.as_str()
            {
                *field = value.to_string();
                changed = true;
            }
        }

        if changed {
            self.verification_status = VerificationStatus::Pending;
            self.verification_notes = None;
            self.verified_by = None;
            self.verified_at = None;
        }
        changed
    }
}

/// Validates the identifying fields of a new or edited account.
///
/// Account numbers may contain digits, spaces and dashes only.
pub fn validate_account_fields(
    account_number: &str,
    account_name: &str,
    bank_name: &str,
) -> Result<(), PayeeError> {
    let number = account_number.trim();
    if number.is_empty() {
        return Err(PayeeError::InvalidAccount(
            "account_number is required".to_string(),
        ));
    }
    if !number
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == ' ')
    {
        return Err(PayeeError::InvalidAccount(
            "account_number may only contain digits, spaces and dashes".to_string(),
        ));
    }
    if account_name.trim().is_empty() {
        return Err(PayeeError::InvalidAccount(
            "account_name is required".to_string(),
        ));
    }
    if bank_name.trim().is_empty() {
        return Err(PayeeError::InvalidAccount("bank_name is required".to_string()));
    }
    Ok(())
}
