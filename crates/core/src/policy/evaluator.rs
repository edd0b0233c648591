//! Outcome of a proposed transaction.
//!
//! - A failed payee check rejects outright.
//! - A matching workflow routes the transaction for approval, whether or not
//!   a limit is violated.
//! - A limit violation with no matching workflow rejects.
//! - Otherwise the transaction is approved without review.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use rimba_shared::PolicyConfig;
use rimba_shared::types::ApprovalWorkflowId;

use crate::payee::{BankAccount, PayeePolicy};
use crate::spending::{
    AggregationCalendar, LimitType, LimitViolation, PriorTransaction, SpendingError,
    SpendingEvaluator, SpendingLimit, TransactionProposal,
};
use crate::workflow::{ApprovalEngine, ApprovalWorkflow, WorkflowType};

/// Why a transaction was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// The payee check failed.
    Payee {
        /// Machine-readable code.
        code: String,
        /// Human-readable message.
        message: String,
    },
    /// A spending limit was exceeded and no workflow can approve it.
    LimitExceeded {
        /// The violated limit.
        violation: LimitViolation,
    },
}

/// Decision for a proposed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyOutcome {
    /// Book immediately.
    AutoApproved {
        /// Effective limits that were checked.
        effective_limits: BTreeMap<LimitType, Decimal>,
    },
    /// Route to an approval request under `workflow_id`.
    RequiresApproval {
        /// Governing workflow.
        workflow_id: ApprovalWorkflowId,
        /// Its name.
        workflow_name: String,
        /// Distinct approving roles required.
        min_approvals: u32,
        /// Limits exceeded, if any.
        violations: Vec<LimitViolation>,
    },
    /// Refuse.
    Rejected {
        /// Every reason found.
        reasons: Vec<RejectionReason>,
    },
}

impl PolicyOutcome {
    /// Returns the wire name of the outcome.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AutoApproved { .. } => "AUTO_APPROVED",
            Self::RequiresApproval { .. } => "REQUIRES_APPROVAL",
            Self::Rejected { .. } => "REJECTED",
        }
    }
}

/// Everything the policy needs to decide on a proposal.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInputs<'a> {
    /// The proposal.
    pub proposal: &'a TransactionProposal,
    /// Every spending limit (filtering happens here).
    pub limits: &'a [SpendingLimit],
    /// Prior transactions of the actor.
    pub history: &'a [PriorTransaction],
    /// Every approval workflow (filtering happens here).
    pub workflows: &'a [ApprovalWorkflow],
    /// The looked-up payee account, if the proposal names one and it exists.
    pub payee: Option<&'a BankAccount>,
}

/// Evaluates proposals against the configured calendar and cashless threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionPolicy {
    calendar: AggregationCalendar,
    payee: PayeePolicy,
}

impl TransactionPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(calendar: AggregationCalendar, payee: PayeePolicy) -> Self {
        Self { calendar, payee }
    }

    /// Creates a policy from configuration.
    ///
    /// # Errors
    ///
    /// Returns `SpendingError::UnknownTimezone` for a bad timezone name.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, SpendingError> {
        Ok(Self::new(
            AggregationCalendar::from_name(&config.aggregation_timezone)?,
            PayeePolicy::new(config.cashless_threshold),
        ))
    }

    /// The aggregation calendar.
    #[must_use]
    pub const fn calendar(&self) -> &AggregationCalendar {
        &self.calendar
    }

    /// The payee policy.
    #[must_use]
    pub const fn payee_policy(&self) -> &PayeePolicy {
        &self.payee
    }

    /// Decides on a proposal.
    ///
    /// # Errors
    ///
    /// Returns a `SpendingError` for non-positive amounts or arithmetic
    /// overflow; policy refusals are reported as [`PolicyOutcome::Rejected`].
    pub fn evaluate(&self, inputs: PolicyInputs<'_>) -> Result<PolicyOutcome, SpendingError> {
        let proposal = inputs.proposal;
        proposal.validate()?;

        let mut reasons = Vec::new();
        if let Err(e) = self.payee.check(
            proposal.amount.amount,
            proposal.payee_account_id,
            inputs.payee,
        ) {
            reasons.push(RejectionReason::Payee {
                code: e.error_code().to_string(),
                message: e.to_string(),
            });
        }

        let spending =
            SpendingEvaluator::evaluate(inputs.limits, proposal, inputs.history, &self.calendar)?;

        if !reasons.is_empty() {
            reasons.extend(
                spending
                    .violations
                    .into_iter()
                    .map(|violation| RejectionReason::LimitExceeded { violation }),
            );
            return Ok(PolicyOutcome::Rejected { reasons });
        }

        let workflow = ApprovalEngine::select(
            inputs.workflows,
            WorkflowType::Transaction,
            proposal.ledger_type,
            proposal.amount.amount,
        );

        Ok(match workflow {
            Some(wf) => PolicyOutcome::RequiresApproval {
                workflow_id: wf.id,
                workflow_name: wf.workflow_name.clone(),
                min_approvals: wf.min_approvals,
                violations: spending.violations,
            },
            None if !spending.is_within_limits() => PolicyOutcome::Rejected {
                reasons: spending
                    .violations
                    .into_iter()
                    .map(|violation| RejectionReason::LimitExceeded { violation })
                    .collect(),
            },
            None => PolicyOutcome::AutoApproved {
                effective_limits: spending.effective_limits,
            },
        })
    }
}
