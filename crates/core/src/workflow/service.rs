//! Approval request state machine.
//!
//! A request is approved once the distinct roles among its approving
//! actions, each contributed by a distinct user, reach `min_approvals`.
//! Any single rejection is final. A request with no human action is
//! auto-approved exactly `auto_approve_days` after submission.

use chrono::{DateTime, TimeDelta, Utc};

use crate::access::{AccessContext, Role};
use crate::workflow::approval::ApprovalEngine;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{
    ApprovalAction, ApprovalRequest, ApprovalStatus, ApprovalWorkflow, Decision,
};

/// Stateless service applying actions to approval requests.
///
/// Every method re-checks the auto-approval timer first, so a request that
/// timed out is decided before any late action is considered.
pub struct ApprovalService;

impl ApprovalService {
    /// The instant a request auto-approves, if its workflow has a timer.
    #[must_use]
    pub fn auto_approve_at(
        request: &ApprovalRequest,
        workflow: &ApprovalWorkflow,
    ) -> Option<DateTime<Utc>> {
        let days = workflow.auto_approve_days.filter(|d| *d > 0)?;
        let delta = TimeDelta::try_days(i64::from(days))?;
        request.submitted_at.checked_add_signed(delta)
    }

    /// Auto-approves the request if it is due.
    ///
    /// Only pending requests with zero actions are eligible; the decision is
    /// stamped at the due instant. Returns whether the request changed.
    pub fn apply_auto_approval(
        request: &mut ApprovalRequest,
        workflow: &ApprovalWorkflow,
        now: DateTime<Utc>,
    ) -> bool {
        if request.status != ApprovalStatus::Pending || !request.actions.is_empty() {
            return false;
        }
        match Self::auto_approve_at(request, workflow) {
            Some(due) if now >= due => {
                request.status = ApprovalStatus::AutoApproved;
                request.decided_at = Some(due);
                true
            }
            _ => false,
        }
    }

    /// Records an approval and returns the resulting status.
    ///
    /// # Errors
    ///
    /// - `AlreadyDecided` if the request is no longer pending
    /// - `SelfApproval` if the actor submitted the request
    /// - `AlreadyActed` if the actor already acted
    /// - `NotAnApprover` if the actor may not act on this workflow
    /// - `RoleAlreadyRepresented` if another user with the same role approved
    pub fn approve(
        request: &mut ApprovalRequest,
        workflow: &ApprovalWorkflow,
        actor: &AccessContext,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApprovalStatus, WorkflowError> {
        let role = Self::check_actor(request, workflow, actor, now)?;
        if request.approving_roles().contains(&role) {
            return Err(WorkflowError::RoleAlreadyRepresented(role));
        }

        request.actions.push(ApprovalAction {
            approver_id: actor.user_id,
            approver_role: role,
            decision: Decision::Approve,
            note,
            acted_at: now,
        });

        if request.approving_roles().len() >= workflow.min_approvals as usize {
            request.status = ApprovalStatus::Approved;
            request.decided_at = Some(now);
        }
        Ok(request.status)
    }

    /// Records a rejection; the request is rejected immediately.
    ///
    /// # Errors
    ///
    /// Same as [`Self::approve`], except `RoleAlreadyRepresented`.
    pub fn reject(
        request: &mut ApprovalRequest,
        workflow: &ApprovalWorkflow,
        actor: &AccessContext,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ApprovalStatus, WorkflowError> {
        let role = Self::check_actor(request, workflow, actor, now)?;

        request.actions.push(ApprovalAction {
            approver_id: actor.user_id,
            approver_role: role,
            decision: Decision::Reject,
            note,
            acted_at: now,
        });
        request.status = ApprovalStatus::Rejected;
        request.decided_at = Some(now);
        Ok(request.status)
    }

    fn check_actor(
        request: &mut ApprovalRequest,
        workflow: &ApprovalWorkflow,
        actor: &AccessContext,
        now: DateTime<Utc>,
    ) -> Result<Role, WorkflowError> {
        if request.workflow_id != workflow.id {
            return Err(WorkflowError::WorkflowMismatch);
        }
        Self::apply_auto_approval(request, workflow, now);
        if request.status.is_final() {
            return Err(WorkflowError::AlreadyDecided(request.status));
        }
        if actor.user_id == request.submitted_by {
            return Err(WorkflowError::SelfApproval);
        }
        if request.has_acted(actor.user_id) {
            return Err(WorkflowError::AlreadyActed(actor.user_id));
        }
        ApprovalEngine::acting_role(workflow, actor)
    }
}
