//! Approval workflow matching.
//!
//! When several workflows match a request, the one requiring the most
//! approvals governs. Ties go to the higher amount threshold, then to the
//! lexicographically smaller name, then to the smaller id, so selection is
//! deterministic.

use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::access::{AccessContext, Role};
use crate::spending::LedgerType;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{ApprovalWorkflow, WorkflowType};

/// Stateless engine for selecting workflows and checking who may act.
pub struct ApprovalEngine;

impl ApprovalEngine {
    /// All workflows matching a request, governing workflow first.
    #[must_use]
    pub fn candidates<'a>(
        workflows: &'a [ApprovalWorkflow],
        workflow_type: WorkflowType,
        ledger: LedgerType,
        amount: Decimal,
    ) -> Vec<&'a ApprovalWorkflow> {
        let mut applicable: Vec<_> = workflows
            .iter()
            .filter(|w| w.matches(workflow_type, ledger, amount))
            .collect();
        applicable.sort_by(|a, b| Self::precedence(a, b));
        applicable
    }

    /// The workflow governing a request, if any matches.
    #[must_use]
    pub fn select<'a>(
        workflows: &'a [ApprovalWorkflow],
        workflow_type: WorkflowType,
        ledger: LedgerType,
        amount: Decimal,
    ) -> Option<&'a ApprovalWorkflow> {
        Self::candidates(workflows, workflow_type, ledger, amount)
            .into_iter()
            .next()
    }

    /// Ordering where the governing workflow sorts first.
    fn precedence(a: &ApprovalWorkflow, b: &ApprovalWorkflow) -> Ordering {
        b.min_approvals
            .cmp(&a.min_approvals)
            // None sorts below Some, so reverse for "higher threshold first"
            .then_with(|| b.amount_threshold.cmp(&a.amount_threshold))
            .then_with(|| a.workflow_name.cmp(&b.workflow_name))
            .then_with(|| a.id.0.cmp(&b.id.0))
    }

    /// The role an actor's action is recorded under.
    ///
    /// Listed roles act as themselves. God-mode users may act on any
    /// workflow, still recorded under their own role.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotAnApprover` when the role is not listed and
    /// the actor lacks god mode.
    pub fn acting_role(
        workflow: &ApprovalWorkflow,
        actor: &AccessContext,
    ) -> Result<Role, WorkflowError> {
        if workflow.lists_role(actor.role) || actor.god_mode {
            Ok(actor.role)
        } else {
            Err(WorkflowError::NotAnApprover(actor.role))
        }
    }
}
