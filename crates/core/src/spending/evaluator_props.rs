//! Property-based tests for SpendingEvaluator.

use proptest::prelude::*;
use rust_decimal::Decimal;

use rimba_shared::types::{Currency, SpendingLimitId};

use crate::access::Role;
use crate::spending::evaluator::SpendingEvaluator;
use crate::spending::types::{LedgerScope, LedgerType, LimitType, SpendingLimit};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_scope() -> impl Strategy<Value = Option<LedgerScope>> {
    prop_oneof![
        Just(None),
        Just(Some(LedgerScope::All)),
        Just(Some(LedgerScope::Operasional)),
        Just(Some(LedgerScope::Proyek)),
    ]
}

fn arb_limit() -> impl Strategy<Value = SpendingLimit> {
    (
        prop::sample::select(LimitType::ALL.to_vec()),
        arb_scope(),
        arb_amount(),
        any::<bool>(),
    )
        .prop_map(|(limit_type, ledger_type, limit_amount, is_active)| SpendingLimit {
            id: SpendingLimitId::new(),
            role: Role::FinanceOperational,
            limit_type,
            ledger_type,
            limit_amount,
            currency: Currency::Idr,
            is_active,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The effective limit per type is the minimum among active matching rows.
    #[test]
    fn prop_effective_limit_is_min_of_matching(limits in prop::collection::vec(arb_limit(), 0..12)) {
        let ledger = LedgerType::Operasional;
        let effective = SpendingEvaluator::effective_limits(
            &limits,
            Role::FinanceOperational,
            ledger,
            Currency::Idr,
        );

        for limit_type in LimitType::ALL {
            let expected = limits
                .iter()
                .filter(|l| l.is_active && l.limit_type == limit_type && l.scope().covers(ledger))
                .map(|l| l.limit_amount)
                .min();
            prop_assert_eq!(effective.get(&limit_type).copied(), expected);
        }
    }

    /// Toggling a limit twice restores it exactly.
    #[test]
    fn prop_toggle_twice_is_identity(limit in arb_limit()) {
        prop_assert_eq!(limit.toggled().toggled(), limit);
    }
}
