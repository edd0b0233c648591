//! Approval workflow domain types.
//!
//! A workflow is a declarative row describing who must sign off on a kind of
//! request. An approval request is one instance routed through a workflow,
//! together with the actions taken on it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use rimba_shared::types::{ApprovalRequestId, ApprovalWorkflowId, Money, UserId};

use crate::access::Role;
use crate::spending::{LedgerScope, LedgerType, TransactionStatus};
use crate::workflow::error::WorkflowError;

/// The kind of request a workflow governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowType {
    /// Financial transactions.
    Transaction,
    /// Budget submissions.
    Budget,
    /// Grant disbursements.
    Grant,
    /// Community benefit distributions.
    BenefitDistribution,
    /// Report publication.
    Report,
}

impl WorkflowType {
    /// Every workflow type.
    pub const ALL: [Self; 5] = [
        Self::Transaction,
        Self::Budget,
        Self::Grant,
        Self::BenefitDistribution,
        Self::Report,
    ];

    /// Returns the string representation of the workflow type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "TRANSACTION",
            Self::Budget => "BUDGET",
            Self::Grant => "GRANT",
            Self::BenefitDistribution => "BENEFIT_DISTRIBUTION",
            Self::Report => "REPORT",
        }
    }

    /// Parses a workflow type (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|t| t.as_str() == needle)
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| WorkflowError::UnknownWorkflowType(s.to_string()))
    }
}

/// A declarative approval workflow row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalWorkflow {
    /// Workflow ID.
    pub id: ApprovalWorkflowId,
    /// Human-readable name.
    pub workflow_name: String,
    /// Kind of request governed.
    pub workflow_type: WorkflowType,
    /// Distinct approving roles needed.
    pub min_approvals: u32,
    /// Roles allowed to act.
    pub required_roles: BTreeSet<Role>,
    /// Applies to amounts at or above this value; `None` applies to every amount.
    pub amount_threshold: Option<Decimal>,
    /// Ledger scope; `None` means every ledger.
    pub ledger_type: Option<LedgerScope>,
    /// Auto-approve after this many days without any action.
    pub auto_approve_days: Option<u32>,
    /// Inactive workflows never match.
    pub is_active: bool,
}

impl ApprovalWorkflow {
    /// Checks the row's own invariants.
    ///
    /// # Errors
    ///
    /// - `InvalidWorkflow` for an empty name, `min_approvals == 0`, a negative
    ///   threshold, or `auto_approve_days == 0`
    /// - `UnsatisfiableWorkflow` when fewer distinct roles than `min_approvals`
    ///   are listed
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.workflow_name.trim().is_empty() {
            return Err(WorkflowError::InvalidWorkflow(
                "workflow_name must not be empty".to_string(),
            ));
        }
        if self.min_approvals == 0 {
            return Err(WorkflowError::InvalidWorkflow(
                "min_approvals must be at least 1".to_string(),
            ));
        }
        if self
            .amount_threshold
            .is_some_and(|t| t.is_sign_negative() && !t.is_zero())
        {
            return Err(WorkflowError::InvalidWorkflow(
                "amount_threshold must not be negative".to_string(),
            ));
        }
        if self.auto_approve_days == Some(0) {
            return Err(WorkflowError::InvalidWorkflow(
                "auto_approve_days must be positive".to_string(),
            ));
        }
        let distinct = self.required_roles.len();
        if distinct < self.min_approvals as usize {
            return Err(WorkflowError::UnsatisfiableWorkflow {
                min_approvals: self.min_approvals,
                distinct_roles: distinct,
            });
        }
        Ok(())
    }

    /// The effective ledger scope.
    #[must_use]
    pub fn scope(&self) -> LedgerScope {
        LedgerScope::resolve(self.ledger_type)
    }

    /// Whether this workflow governs a request of `workflow_type` on `ledger` for `amount`.
    #[must_use]
    pub fn matches(&self, workflow_type: WorkflowType, ledger: LedgerType, amount: Decimal) -> bool {
        self.is_active
            && self.workflow_type == workflow_type
            && self.scope().covers(ledger)
            && self.amount_threshold.is_none_or(|t| amount >= t)
    }

    /// Whether `role` is listed among the workflow's required roles.
    #[must_use]
    pub fn lists_role(&self, role: Role) -> bool {
        self.required_roles.contains(&role)
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

/// Status of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Waiting for approvers.
    Pending,
    /// Enough distinct roles approved.
    Approved,
    /// An approver rejected it.
    Rejected,
    /// Approved by the inaction timer.
    AutoApproved,
}

impl ApprovalStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::AutoApproved => "AUTO_APPROVED",
        }
    }

    /// Parses a status (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "AUTO_APPROVED" => Some(Self::AutoApproved),
            _ => None,
        }
    }

    /// Returns true once the request is decided.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The status the underlying transaction takes.
    #[must_use]
    pub const fn transaction_status(&self) -> TransactionStatus {
        match self {
            Self::Pending => TransactionStatus::PendingApproval,
            Self::Approved | Self::AutoApproved => TransactionStatus::Approved,
            Self::Rejected => TransactionStatus::Rejected,
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An approver's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Sign off.
    Approve,
    /// Refuse; final.
    Reject,
}

impl Decision {
    /// Returns the string representation of the decision.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
        }
    }

    /// Parses a decision (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "APPROVE" => Some(Self::Approve),
            "REJECT" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// One approver action on a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalAction {
    /// Acting user.
    pub approver_id: UserId,
    /// Acting user's role at the time.
    pub approver_role: Role,
    /// What they decided.
    pub decision: Decision,
    /// Optional note.
    pub note: Option<String>,
    /// When they acted.
    pub acted_at: DateTime<Utc>,
}

/// A request routed through a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Request ID.
    pub id: ApprovalRequestId,
    /// Governing workflow.
    pub workflow_id: ApprovalWorkflowId,
    /// Kind of subject.
    pub subject_type: WorkflowType,
    /// ID of the subject (e.g. the transaction).
    pub subject_id: Uuid,
    /// Amount under approval.
    pub amount: Money,
    /// Ledger of the subject.
    pub ledger_type: LedgerType,
    /// Who submitted it.
    pub submitted_by: UserId,
    /// When it was submitted.
    pub submitted_at: DateTime<Utc>,
    /// Current status.
    pub status: ApprovalStatus,
    /// When it was decided.
    pub decided_at: Option<DateTime<Utc>>,
    /// Actions so far, oldest first.
    pub actions: Vec<ApprovalAction>,
}

impl ApprovalRequest {
    /// Opens a pending request for a subject under `workflow`.
    #[must_use]
    pub fn open(
        workflow: &ApprovalWorkflow,
        subject_id: Uuid,
        amount: Money,
        ledger_type: LedgerType,
        submitted_by: UserId,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ApprovalRequestId::new(),
            workflow_id: workflow.id,
            subject_type: workflow.workflow_type,
            subject_id,
            amount,
            ledger_type,
            submitted_by,
            submitted_at,
            status: ApprovalStatus::Pending,
            decided_at: None,
            actions: Vec::new(),
        }
    }

    /// Distinct roles among the approving actions.
    #[must_use]
    pub fn approving_roles(&self) -> BTreeSet<Role> {
        self.actions
            .iter()
            .filter(|a| a.decision == Decision::Approve)
            .map(|a| a.approver_role)
            .collect()
    }

    /// Whether `user` has already acted on this request.
    #[must_use]
    pub fn has_acted(&self, user: UserId) -> bool {
        self.actions.iter().any(|a| a.approver_id == user)
    }
}
