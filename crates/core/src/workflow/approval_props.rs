//! Property-based tests for ApprovalEngine.

use proptest::prelude::*;
use rust_decimal::Decimal;

use rimba_shared::types::ApprovalWorkflowId;

use crate::access::Role;
use crate::spending::{LedgerScope, LedgerType};
use crate::workflow::approval::ApprovalEngine;
use crate::workflow::types::{ApprovalWorkflow, WorkflowType};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..20_000_000i64).prop_map(|n| Decimal::new(n, 0))
}

fn arb_workflow() -> impl Strategy<Value = ApprovalWorkflow> {
    (
        1u32..4,
        prop::option::of(arb_amount()),
        prop_oneof![
            Just(None),
            Just(Some(LedgerScope::All)),
            Just(Some(LedgerScope::Operasional)),
            Just(Some(LedgerScope::Proyek)),
        ],
        any::<bool>(),
        "[a-z]{1,8}",
    )
        .prop_map(
            |(min_approvals, amount_threshold, ledger_type, is_active, name)| ApprovalWorkflow {
                id: ApprovalWorkflowId::new(),
                workflow_name: name,
                workflow_type: WorkflowType::Transaction,
                min_approvals,
                required_roles: Role::ALL.into_iter().take(min_approvals as usize).collect(),
                amount_threshold,
                ledger_type,
                auto_approve_days: None,
                is_active,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The selected workflow matches and requires at least as many approvals as any other match.
    #[test]
    fn prop_selected_requires_most_approvals(
        workflows in prop::collection::vec(arb_workflow(), 0..8),
        amount in arb_amount(),
    ) {
        let ledger = LedgerType::Operasional;
        let selected = ApprovalEngine::select(&workflows, WorkflowType::Transaction, ledger, amount);
        let matching: Vec<_> = workflows
            .iter()
            .filter(|w| w.matches(WorkflowType::Transaction, ledger, amount))
            .collect();

        match selected {
            None => prop_assert!(matching.is_empty()),
            Some(wf) => {
                prop_assert!(wf.matches(WorkflowType::Transaction, ledger, amount));
                for other in matching {
                    prop_assert!(wf.min_approvals >= other.min_approvals);
                }
            }
        }
    }

    /// Selection does not depend on input order.
    #[test]
    fn prop_selection_is_order_independent(
        workflows in prop::collection::vec(arb_workflow(), 0..8),
        amount in arb_amount(),
    ) {
        let mut reversed = workflows.clone();
        reversed.reverse();

        let a = ApprovalEngine::select(&workflows, WorkflowType::Transaction, LedgerType::Proyek, amount);
        let b = ApprovalEngine::select(&reversed, WorkflowType::Transaction, LedgerType::Proyek, amount);
        prop_assert_eq!(a.map(|w| w.id), b.map(|w| w.id));
    }

    /// Toggling a workflow twice restores it exactly.
    #[test]
    fn prop_toggle_twice_is_identity(wf in arb_workflow()) {
        prop_assert_eq!(wf.toggled().toggled(), wf);
    }
}
