//! Property-based tests for ApprovalService.

use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;
use rust_decimal_macros::dec;
use uuid::Uuid;

use rimba_shared::types::{ApprovalWorkflowId, Money, UserId};

use crate::access::{AccessContext, Role};
use crate::spending::LedgerType;
use crate::workflow::service::ApprovalService;
use crate::workflow::types::{ApprovalRequest, ApprovalStatus, ApprovalWorkflow, WorkflowType};

fn workflow(min_approvals: u32, auto_approve_days: Option<u32>) -> ApprovalWorkflow {
    ApprovalWorkflow {
        id: ApprovalWorkflowId::new(),
        workflow_name: "Property workflow".to_string(),
        workflow_type: WorkflowType::Transaction,
        min_approvals,
        required_roles: Role::ALL.into_iter().collect(),
        amount_threshold: None,
        ledger_type: None,
        auto_approve_days,
        is_active: true,
    }
}

fn submitted_at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-10T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn open(wf: &ApprovalWorkflow) -> ApprovalRequest {
    ApprovalRequest::open(
        wf,
        Uuid::new_v4(),
        Money::idr(dec!(6000000)),
        LedgerType::Operasional,
        UserId::new(),
        submitted_at(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// With min_approvals = 2, approvals from a single role never approve the request,
    /// however many times or by however many users it is attempted.
    #[test]
    fn prop_one_role_never_satisfies_two(role_idx in 0usize..11, attempts in 1usize..6, same_user in any::<bool>()) {
        let wf = workflow(2, None);
        let mut req = open(&wf);
        let role = Role::ALL[role_idx];
        let repeat = AccessContext::new(UserId::new(), role);

        for _ in 0..attempts {
            let actor = if same_user { repeat } else { AccessContext::new(UserId::new(), role) };
            let _ = ApprovalService::approve(&mut req, &wf, &actor, None, submitted_at());
        }

        prop_assert_eq!(req.status, ApprovalStatus::Pending);
        prop_assert_eq!(req.approving_roles().len(), 1);
    }

    /// Approval is reached exactly when min_approvals distinct roles have approved.
    #[test]
    fn prop_distinct_roles_reach_threshold(min in 1u32..5) {
        let wf = workflow(min, None);
        let mut req = open(&wf);

        for (i, role) in Role::ALL.into_iter().take(min as usize).enumerate() {
            let status = ApprovalService::approve(
                &mut req,
                &wf,
                &AccessContext::new(UserId::new(), role),
                None,
                submitted_at(),
            )
            .unwrap();
            let expected = if i + 1 == min as usize {
                ApprovalStatus::Approved
            } else {
                ApprovalStatus::Pending
            };
            prop_assert_eq!(status, expected);
        }
    }

    /// Auto-approval never fires before the boundary and always fires at or after it.
    #[test]
    fn prop_auto_approval_boundary(days in 1u32..30, offset_secs in -86_400i64..86_400i64) {
        let wf = workflow(1, Some(days));
        let mut req = open(&wf);
        let due = submitted_at() + TimeDelta::days(i64::from(days));
        let now = due + TimeDelta::seconds(offset_secs);

        let changed = ApprovalService::apply_auto_approval(&mut req, &wf, now);
        prop_assert_eq!(changed, now >= due);
        if changed {
            prop_assert_eq!(req.status, ApprovalStatus::AutoApproved);
            prop_assert_eq!(req.decided_at, Some(due));
        }
    }
}
