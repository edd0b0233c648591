//! Workflow error types for approval requests.
//!
//! This module defines all error types that can occur while validating
//! workflows or acting on approval requests.

use thiserror::Error;

use rimba_shared::types::UserId;

use crate::access::Role;
use crate::workflow::types::ApprovalStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// A workflow field is out of range.
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// The workflow lists fewer distinct roles than approvals it requires.
    #[error("Workflow requires {min_approvals} approvals but lists only {distinct_roles} distinct roles")]
    UnsatisfiableWorkflow {
        /// Required number of approvals.
        min_approvals: u32,
        /// Distinct roles listed.
        distinct_roles: usize,
    },

    /// Unknown workflow type string.
    #[error("Unknown workflow type: {0}")]
    UnknownWorkflowType(String),

    /// The submitter tried to act on their own request.
    #[error("Submitters cannot approve or reject their own request")]
    SelfApproval,

    /// The user already acted on this request.
    #[error("User {0} has already acted on this request")]
    AlreadyActed(UserId),

    /// Another approver with the same role already approved.
    #[error("Role {0} has already approved this request")]
    RoleAlreadyRepresented(Role),

    /// The user's role is not among the workflow's required roles.
    #[error("Role {0} is not an approver for this workflow")]
    NotAnApprover(Role),

    /// The request has already been decided.
    #[error("Request is already {0}")]
    AlreadyDecided(ApprovalStatus),

    /// The request does not belong to the given workflow.
    #[error("Approval request does not belong to this workflow")]
    WorkflowMismatch,
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidWorkflow(_)
            | Self::UnsatisfiableWorkflow { .. }
            | Self::UnknownWorkflowType(_) => 400,

            Self::SelfApproval | Self::NotAnApprover(_) => 403,

            Self::AlreadyActed(_) | Self::RoleAlreadyRepresented(_) | Self::AlreadyDecided(_) => {
                409
            }

            Self::WorkflowMismatch => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidWorkflow(_) => "INVALID_WORKFLOW",
            Self::UnsatisfiableWorkflow { .. } => "UNSATISFIABLE_WORKFLOW",
            Self::UnknownWorkflowType(_) => "UNKNOWN_WORKFLOW_TYPE",
            Self::SelfApproval => "SELF_APPROVAL_FORBIDDEN",
            Self::AlreadyActed(_) => "ALREADY_ACTED",
            Self::RoleAlreadyRepresented(_) => "ROLE_ALREADY_REPRESENTED",
            Self::NotAnApprover(_) => "NOT_AN_APPROVER",
            Self::AlreadyDecided(_) => "ALREADY_DECIDED",
            Self::WorkflowMismatch => "WORKFLOW_MISMATCH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsatisfiable_workflow_error() {
        let err = WorkflowError::UnsatisfiableWorkflow {
            min_approvals: 3,
            distinct_roles: 2,
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "UNSATISFIABLE_WORKFLOW");
        assert!(err.to_string().contains("3 approvals"));
    }

    #[test]
    fn test_self_approval_error() {
        let err = WorkflowError::SelfApproval;
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "SELF_APPROVAL_FORBIDDEN");
    }

    #[test]
    fn test_role_already_represented_error() {
        let err = WorkflowError::RoleAlreadyRepresented(Role::FinanceManager);
        assert_eq!(err.status_code(), 409);
        assert!(err.to_string().contains("finance_manager"));
    }

    #[test]
    fn test_already_decided_error() {
        let err = WorkflowError::AlreadyDecided(ApprovalStatus::Rejected);
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.to_string(), "Request is already REJECTED");
    }

    #[test]
    fn test_not_an_approver_error() {
        let err = WorkflowError::NotAnApprover(Role::Viewer);
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "NOT_AN_APPROVER");
    }
}
