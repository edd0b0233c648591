//! Spending limit evaluation.
//!
//! Every active limit row matching the actor's role, the transaction's
//! currency and ledger is checked against its own scope. The tightest
//! constraint therefore always wins, and the effective limit reported per
//! limit type is the minimum amount among the matching rows.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use rimba_shared::types::{Currency, SpendingLimitId};

use crate::access::Role;
use crate::spending::error::SpendingError;
use crate::spending::types::{
    LedgerScope, LedgerType, LimitType, PriorTransaction, SpendingLimit, TransactionProposal,
};
use crate::spending::window::{AggregationCalendar, Period};

/// A limit the proposal would exceed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitViolation {
    /// The violated limit row.
    pub limit_id: SpendingLimitId,
    /// Its aggregation type.
    pub limit_type: LimitType,
    /// Its ledger scope.
    pub scope: LedgerScope,
    /// Its amount.
    pub limit_amount: Decimal,
    /// Amount the limit was compared against (period total for periodic limits).
    pub attempted_amount: Decimal,
}

/// Result of checking a proposal against every applicable limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpendingCheck {
    /// Effective (minimum) limit per type among the matching rows.
    pub effective_limits: BTreeMap<LimitType, Decimal>,
    /// Violated rows; empty when the proposal is within every limit.
    pub violations: Vec<LimitViolation>,
}

impl SpendingCheck {
    /// Whether no limit is violated.
    #[must_use]
    pub fn is_within_limits(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Stateless engine for evaluating spending limits.
pub struct SpendingEvaluator;

impl SpendingEvaluator {
    /// Active limits constraining `role` on `ledger` in `currency`.
    #[must_use]
    pub fn applicable(
        limits: &[SpendingLimit],
        role: Role,
        ledger: LedgerType,
        currency: Currency,
    ) -> Vec<&SpendingLimit> {
        limits
            .iter()
            .filter(|l| l.applies_to(role, ledger, currency))
            .collect()
    }

    /// Minimum `limit_amount` per limit type among the applicable rows.
    #[must_use]
    pub fn effective_limits(
        limits: &[SpendingLimit],
        role: Role,
        ledger: LedgerType,
        currency: Currency,
    ) -> BTreeMap<LimitType, Decimal> {
        let mut effective: BTreeMap<LimitType, Decimal> = BTreeMap::new();
        for limit in Self::applicable(limits, role, ledger, currency) {
            effective
                .entry(limit.limit_type)
                .and_modify(|amount| *amount = (*amount).min(limit.limit_amount))
                .or_insert(limit.limit_amount);
        }
        effective
    }

    /// Checks a proposal against every applicable limit.
    ///
    /// `history` may contain anyone's transactions; only the actor's counted
    /// transactions in the same currency contribute to period totals.
    pub fn evaluate(
        limits: &[SpendingLimit],
        proposal: &TransactionProposal,
        history: &[PriorTransaction],
        calendar: &AggregationCalendar,
    ) -> Result<SpendingCheck, SpendingError> {
        proposal.validate()?;

        let role = proposal.actor.role;
        let currency = proposal.amount.currency;
        let applicable = Self::applicable(limits, role, proposal.ledger_type, currency);

        let mut violations = Vec::new();
        for limit in &applicable {
            let attempted = match calendar.period(limit.limit_type, proposal.submitted_at)? {
                None => proposal.amount.amount,
                Some(period) => {
                    let prior = Self::period_total(proposal, history, limit.scope(), period)?;
                    prior
                        .checked_add(proposal.amount.amount)
                        .ok_or(SpendingError::Overflow)?
                }
            };

            if attempted > limit.limit_amount {
                violations.push(LimitViolation {
                    limit_id: limit.id,
                    limit_type: limit.limit_type,
                    scope: limit.scope(),
                    limit_amount: limit.limit_amount,
                    attempted_amount: attempted,
                });
            }
        }

        Ok(SpendingCheck {
            effective_limits: Self::effective_limits(
                limits,
                role,
                proposal.ledger_type,
                currency,
            ),
            violations,
        })
    }

    /// Sum of the actor's counted transactions inside `scope` and `period`.
    fn period_total(
        proposal: &TransactionProposal,
        history: &[PriorTransaction],
        scope: LedgerScope,
        period: Period,
    ) -> Result<Decimal, SpendingError> {
        history
            .iter()
            .filter(|t| t.created_by == proposal.actor.user_id)
            .filter(|t| t.status.counts_toward_limits())
            .filter(|t| t.amount.currency == proposal.amount.currency)
            .filter(|t| scope.covers(t.ledger_type))
            .filter(|t| period.contains(t.recorded_at))
            .try_fold(Decimal::ZERO, |acc, t| {
                acc.checked_add(t.amount.amount).ok_or(SpendingError::Overflow)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessContext;
    use crate::spending::types::TransactionStatus;
    use chrono::{DateTime, Utc};
    use rimba_shared::types::{Money, UserId};
    use rust_decimal_macros::dec;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn limit(
        role: Role,
        limit_type: LimitType,
        ledger_type: Option<LedgerScope>,
        amount: Decimal,
    ) -> SpendingLimit {
        SpendingLimit {
            id: SpendingLimitId::new(),
            role,
            limit_type,
            ledger_type,
            limit_amount: amount,
            currency: Currency::Idr,
            is_active: true,
        }
    }

    fn proposal(actor: AccessContext, ledger: LedgerType, amount: Decimal) -> TransactionProposal {
        TransactionProposal {
            actor,
            ledger_type: ledger,
            amount: Money::idr(amount),
            payee_account_id: None,
            submitted_at: at("2026-03-10T03:00:00Z"),
        }
    }

    fn prior(
        user: UserId,
        ledger: LedgerType,
        amount: Decimal,
        status: TransactionStatus,
        when: &str,
    ) -> PriorTransaction {
        PriorTransaction {
            created_by: user,
            ledger_type: ledger,
            amount: Money::idr(amount),
            status,
            recorded_at: at(when),
        }
    }

    fn operator() -> AccessContext {
        AccessContext::new(UserId::new(), Role::FinanceOperational)
    }

    #[test]
    fn test_per_transaction_limit_exceeded() {
        let limits = vec![limit(
            Role::FinanceOperational,
            LimitType::PerTransaction,
            Some(LedgerScope::Operasional),
            dec!(5000000),
        )];
        let check = SpendingEvaluator::evaluate(
            &limits,
            &proposal(operator(), LedgerType::Operasional, dec!(6000000)),
            &[],
            &AggregationCalendar::default(),
        )
        .unwrap();

        assert_eq!(check.violations.len(), 1);
        assert_eq!(check.violations[0].limit_type, LimitType::PerTransaction);
        assert_eq!(check.violations[0].attempted_amount, dec!(6000000));
    }

    #[test]
    fn test_amount_equal_to_limit_is_allowed() {
        let limits = vec![limit(
            Role::FinanceOperational,
            LimitType::PerTransaction,
            None,
            dec!(5000000),
        )];
        let check = SpendingEvaluator::evaluate(
            &limits,
            &proposal(operator(), LedgerType::Proyek, dec!(5000000)),
            &[],
            &AggregationCalendar::default(),
        )
        .unwrap();
        assert!(check.is_within_limits());
    }

    #[test]
    fn test_other_ledger_limit_does_not_apply() {
        let limits = vec![limit(
            Role::FinanceOperational,
            LimitType::PerTransaction,
            Some(LedgerScope::Proyek),
            dec!(1000),
        )];
        let check = SpendingEvaluator::evaluate(
            &limits,
            &proposal(operator(), LedgerType::Operasional, dec!(6000000)),
            &[],
            &AggregationCalendar::default(),
        )
        .unwrap();
        assert!(check.is_within_limits());
        assert!(check.effective_limits.is_empty());
    }

    #[test]
    fn test_effective_limit_is_minimum() {
        let limits = vec![
            limit(Role::FinanceOperational, LimitType::PerTransaction, None, dec!(9000000)),
            limit(
                Role::FinanceOperational,
                LimitType::PerTransaction,
                Some(LedgerScope::Operasional),
                dec!(5000000),
            ),
            limit(Role::FinanceOperational, LimitType::Daily, None, dec!(20000000)),
        ];
        let effective = SpendingEvaluator::effective_limits(
            &limits,
            Role::FinanceOperational,
            LedgerType::Operasional,
            Currency::Idr,
        );
        assert_eq!(effective[&LimitType::PerTransaction], dec!(5000000));
        assert_eq!(effective[&LimitType::Daily], dec!(20000000));
    }

    #[test]
    fn test_daily_limit_sums_counted_history() {
        let actor = operator();
        let limits = vec![limit(
            Role::FinanceOperational,
            LimitType::Daily,
            Some(LedgerScope::Operasional),
            dec!(10000000),
        )];
        let history = vec![
            prior(
                actor.user_id,
                LedgerType::Operasional,
                dec!(4000000),
                TransactionStatus::Approved,
                "2026-03-10T01:00:00Z",
            ),
            prior(
                actor.user_id,
                LedgerType::Operasional,
                dec!(3000000),
                TransactionStatus::PendingApproval,
                "2026-03-10T02:00:00Z",
            ),
            // rejected: not counted
            prior(
                actor.user_id,
                LedgerType::Operasional,
                dec!(9000000),
                TransactionStatus::Rejected,
                "2026-03-10T02:30:00Z",
            ),
            // other ledger: outside the limit's scope
            prior(
                actor.user_id,
                LedgerType::Proyek,
                dec!(9000000),
                TransactionStatus::Approved,
                "2026-03-10T02:30:00Z",
            ),
            // previous Jakarta day
            prior(
                actor.user_id,
                LedgerType::Operasional,
                dec!(9000000),
                TransactionStatus::Approved,
                "2026-03-09T16:59:59Z",
            ),
            // someone else
            prior(
                UserId::new(),
                LedgerType::Operasional,
                dec!(9000000),
                TransactionStatus::Approved,
                "2026-03-10T02:30:00Z",
            ),
        ];

        let calendar = AggregationCalendar::default();
        let ok = SpendingEvaluator::evaluate(
            &limits,
            &proposal(actor, LedgerType::Operasional, dec!(3000000)),
            &history,
            &calendar,
        )
        .unwrap();
        assert!(ok.is_within_limits());

        let over = SpendingEvaluator::evaluate(
            &limits,
            &proposal(actor, LedgerType::Operasional, dec!(3000001)),
            &history,
            &calendar,
        )
        .unwrap();
        assert_eq!(over.violations.len(), 1);
        assert_eq!(over.violations[0].attempted_amount, dec!(10000001));
    }

    #[test]
    fn test_all_scope_sums_every_ledger() {
        let actor = operator();
        let limits = vec![limit(
            Role::FinanceOperational,
            LimitType::Monthly,
            Some(LedgerScope::All),
            dec!(10000000),
        )];
        let history = vec![prior(
            actor.user_id,
            LedgerType::Proyek,
            dec!(8000000),
            TransactionStatus::Approved,
            "2026-03-02T03:00:00Z",
        )];
        let check = SpendingEvaluator::evaluate(
            &limits,
            &proposal(actor, LedgerType::Operasional, dec!(2500000)),
            &history,
            &AggregationCalendar::default(),
        )
        .unwrap();
        assert_eq!(check.violations.len(), 1);
        assert_eq!(check.violations[0].scope, LedgerScope::All);
    }

    #[test]
    fn test_other_currency_history_is_ignored() {
        let actor = operator();
        let limits = vec![limit(Role::FinanceOperational, LimitType::Annual, None, dec!(100))];
        let mut foreign = prior(
            actor.user_id,
            LedgerType::Operasional,
            dec!(90),
            TransactionStatus::Approved,
            "2026-01-05T00:00:00Z",
        );
        foreign.amount = Money::new(dec!(90), Currency::Usd);

        let check = SpendingEvaluator::evaluate(
            &limits,
            &proposal(actor, LedgerType::Operasional, dec!(50)),
            &[foreign],
            &AggregationCalendar::default(),
        )
        .unwrap();
        assert!(check.is_within_limits());
    }

    #[test]
    fn test_non_positive_amount_is_rejected() {
        assert!(matches!(
            SpendingEvaluator::evaluate(
                &[],
                &proposal(operator(), LedgerType::Operasional, dec!(0)),
                &[],
                &AggregationCalendar::default(),
            ),
            Err(SpendingError::NonPositiveAmount(_))
        ));
    }
}
