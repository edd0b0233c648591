//! Property-based tests for TransactionPolicy.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use rimba_shared::types::{ApprovalWorkflowId, Currency, Money, SpendingLimitId, UserId};

use crate::access::{AccessContext, Role};
use crate::payee::PayeePolicy;
use crate::policy::evaluator::{PolicyInputs, PolicyOutcome, TransactionPolicy};
use crate::spending::{
    AggregationCalendar, LedgerScope, LedgerType, LimitType, SpendingLimit, TransactionProposal,
};
use crate::workflow::{ApprovalWorkflow, WorkflowType};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 0))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A per-transaction violation is never auto-approved: it is routed when a
    /// workflow matches and rejected otherwise.
    #[test]
    fn prop_violation_never_auto_approved(
        limit in arb_amount(),
        excess in 1i64..1_000_000i64,
        threshold in prop::option::of(arb_amount()),
    ) {
        let amount = limit + Decimal::new(excess, 0);
        let proposal = TransactionProposal {
            actor: AccessContext::new(UserId::new(), Role::FinanceOperational),
            ledger_type: LedgerType::Operasional,
            amount: Money::idr(amount),
            payee_account_id: None,
            submitted_at: Utc::now(),
        };
        let limits = [SpendingLimit {
            id: SpendingLimitId::new(),
            role: Role::FinanceOperational,
            limit_type: LimitType::PerTransaction,
            ledger_type: Some(LedgerScope::Operasional),
            limit_amount: limit,
            currency: Currency::Idr,
            is_active: true,
        }];
        let workflows = [ApprovalWorkflow {
            id: ApprovalWorkflowId::new(),
            workflow_name: "Review".to_string(),
            workflow_type: WorkflowType::Transaction,
            min_approvals: 1,
            required_roles: [Role::FinanceManager].into_iter().collect(),
            amount_threshold: threshold,
            ledger_type: None,
            auto_approve_days: None,
            is_active: true,
        }];

        // Keep below the cashless threshold so only limits and workflows matter.
        let policy = TransactionPolicy::new(
            AggregationCalendar::default(),
            PayeePolicy::new(Decimal::new(10_000_000, 0)),
        );
        let outcome = policy
            .evaluate(PolicyInputs {
                proposal: &proposal,
                limits: &limits,
                history: &[],
                workflows: &workflows,
                payee: None,
            })
            .unwrap();

        let routed = threshold.is_none_or(|t| amount >= t);
        if routed {
            let is_routed = matches!(outcome, PolicyOutcome::RequiresApproval { .. });
            prop_assert!(is_routed);
        } else {
            let is_rejected = matches!(outcome, PolicyOutcome::Rejected { .. });
            prop_assert!(is_rejected);
        }
    }
}
