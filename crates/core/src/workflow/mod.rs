//! Approval workflows for Rimba.
//!
//! This module implements workflow matching and the approval request
//! state machine, including the optimistic auto-approval timer.
//!
//! # Modules
//!
//! - `types` - Workflow and approval request domain types
//! - `error` - Workflow-specific error types
//! - `approval` - Workflow selection and approver eligibility
//! - `service` - Approval request state transitions

pub mod approval;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod approval_props;
#[cfg(test)]
mod service_props;

pub use approval::ApprovalEngine;
pub use error::WorkflowError;
pub use service::ApprovalService;
pub use types::{
    ApprovalAction, ApprovalRequest, ApprovalStatus, ApprovalWorkflow, Decision, WorkflowType,
};
