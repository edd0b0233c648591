//! Cashless policy payee check.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use rimba_shared::types::BankAccountId;

use crate::payee::error::PayeeError;
use crate::payee::types::BankAccount;

/// Default cashless threshold, in major currency units.
pub const DEFAULT_CASHLESS_THRESHOLD: Decimal = dec!(1000000);

/// Checks the payee of a transaction against the cashless threshold.
///
/// Amounts strictly above the threshold must name a verified, active
/// payee. Amounts at or below it are not checked beyond the payee existing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayeePolicy {
    cashless_threshold: Decimal,
}

impl PayeePolicy {
    /// Creates a policy with the given threshold.
    #[must_use]
    pub const fn new(cashless_threshold: Decimal) -> Self {
        Self { cashless_threshold }
    }

    /// The configured threshold.
    #[must_use]
    pub const fn cashless_threshold(&self) -> Decimal {
        self.cashless_threshold
    }

    /// Checks a payee for a transaction of `amount`.
    ///
    /// `payee` is the looked-up account for `payee_id`, or `None` if the
    /// lookup found nothing.
    pub fn check(
        &self,
        amount: Decimal,
        payee_id: Option<BankAccountId>,
        payee: Option<&BankAccount>,
    ) -> Result<(), PayeeError> {
        let account = match (payee_id, payee) {
            (Some(id), None) => return Err(PayeeError::PayeeNotFound(id)),
            (_, account) => account,
        };

        if amount <= self.cashless_threshold {
            return Ok(());
        }

        let Some(account) = account else {
            return Err(PayeeError::PayeeRequired {
                threshold: self.cashless_threshold,
            });
        };
        if account.is_usable_payee() {
            Ok(())
        } else {
            Err(PayeeError::PayeeNotVerified {
                account_id: account.id,
                status: account.verification_status,
                is_active: account.is_active,
                threshold: self.cashless_threshold,
            })
        }
    }
}

impl Default for PayeePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CASHLESS_THRESHOLD)
    }
}
