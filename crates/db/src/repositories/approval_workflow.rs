//! Approval Workflow Repository
//!
//! Provides CRUD operations for approval workflows. Every write re-checks
//! the workflow invariants, so a workflow listing fewer distinct roles than
//! approvals it requires can never be stored.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

use rimba_core::access::Role;
use rimba_core::spending::LedgerScope;
use rimba_core::workflow::{ApprovalWorkflow, WorkflowError, WorkflowType};
use rimba_shared::types::ApprovalWorkflowId;

use crate::entities::approval_workflows::{
    self, ActiveModel, Entity as ApprovalWorkflowEntity, Model as ApprovalWorkflowModel,
};

/// Errors that can occur during approval workflow operations.
#[derive(Debug, Error)]
pub enum ApprovalWorkflowError {
    /// Workflow not found.
    #[error("Approval workflow {0} not found")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The workflow violates a workflow rule.
    #[error(transparent)]
    Invalid(#[from] WorkflowError),

    /// A stored row cannot be read back as a domain value.
    #[error("Stored approval workflow {id} is malformed: {reason}")]
    Corrupt {
        /// Row id.
        id: Uuid,
        /// What failed to parse.
        reason: String,
    },
}

/// Input for creating an approval workflow.
#[derive(Debug, Clone)]
pub struct CreateApprovalWorkflowInput {
    /// Display name.
    pub workflow_name: String,
    /// Kind of request the workflow governs.
    pub workflow_type: WorkflowType,
    /// Distinct approving roles required.
    pub min_approvals: u32,
    /// Roles allowed to approve.
    pub required_roles: BTreeSet<Role>,
    /// Minimum amount the workflow applies to.
    pub amount_threshold: Option<Decimal>,
    /// Ledger scope; `None` applies to every ledger.
    pub ledger_type: Option<LedgerScope>,
    /// Days after which an untouched request auto-approves.
    pub auto_approve_days: Option<u32>,
    /// Optional description.
    pub description: Option<String>,
}

/// Input for updating an approval workflow.
#[derive(Debug, Clone, Default)]
pub struct UpdateApprovalWorkflowInput {
    /// New name.
    pub workflow_name: Option<String>,
    /// New type.
    pub workflow_type: Option<WorkflowType>,
    /// New approval count.
    pub min_approvals: Option<u32>,
    /// New role set.
    pub required_roles: Option<BTreeSet<Role>>,
    /// New threshold.
    pub amount_threshold: Option<Option<Decimal>>,
    /// New ledger scope.
    pub ledger_type: Option<Option<LedgerScope>>,
    /// New auto-approval timer.
    pub auto_approve_days: Option<Option<u32>>,
    /// New description.
    pub description: Option<Option<String>>,
    /// Active status.
    pub is_active: Option<bool>,
}

/// Repository for approval workflow operations.
pub struct ApprovalWorkflowRepository {
    db: DatabaseConnection,
}

impl ApprovalWorkflowRepository {
    /// Creates a new ApprovalWorkflowRepository.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new approval workflow.
    pub async fn create_workflow(
        &self,
        input: CreateApprovalWorkflowInput,
    ) -> Result<ApprovalWorkflowModel, ApprovalWorkflowError> {
        let workflow = ApprovalWorkflow {
            id: ApprovalWorkflowId::new(),
            workflow_name: input.workflow_name.trim().to_string(),
            workflow_type: input.workflow_type,
            min_approvals: input.min_approvals,
            required_roles: input.required_roles,
            amount_threshold: input.amount_threshold,
            ledger_type: input.ledger_type,
            auto_approve_days: input.auto_approve_days,
            is_active: true,
        };
        workflow.validate()?;

        let now = Utc::now();
        let mut model = ActiveModel {
            description: Set(input.description),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        write_domain(&mut model, &workflow)?;

        let result = model.insert(&self.db).await?;
        Ok(result)
    }

    /// Lists approval workflows ordered by name.
    pub async fn list_workflows(
        &self,
        active_only: bool,
    ) -> Result<Vec<ApprovalWorkflowModel>, ApprovalWorkflowError> {
        let mut query = ApprovalWorkflowEntity::find();
        if active_only {
            query = query.filter(approval_workflows::Column::IsActive.eq(true));
        }
        let workflows = query
            .order_by_asc(approval_workflows::Column::WorkflowName)
            .all(&self.db)
            .await?;

        Ok(workflows)
    }

    /// Gets a specific workflow by ID.
    pub async fn get_workflow(
        &self,
        workflow_id: Uuid,
    ) -> Result<ApprovalWorkflowModel, ApprovalWorkflowError> {
        ApprovalWorkflowEntity::find_by_id(workflow_id)
            .one(&self.db)
            .await?
            .ok_or(ApprovalWorkflowError::NotFound(workflow_id))
    }

    /// Gets a workflow as a domain value.
    pub async fn get_domain(
        &self,
        workflow_id: Uuid,
    ) -> Result<ApprovalWorkflow, ApprovalWorkflowError> {
        to_domain(&self.get_workflow(workflow_id).await?)
    }

    /// Updates a workflow, validating the merged result before writing.
    pub async fn update_workflow(
        &self,
        workflow_id: Uuid,
        input: UpdateApprovalWorkflowInput,
    ) -> Result<ApprovalWorkflowModel, ApprovalWorkflowError> {
        let existing = self.get_workflow(workflow_id).await?;
        let mut workflow = to_domain(&existing)?;

        if let Some(name) = input.workflow_name {
            workflow.workflow_name = name.trim().to_string();
        }
        if let Some(workflow_type) = input.workflow_type {
            workflow.workflow_type = workflow_type;
        }
        if let Some(min_approvals) = input.min_approvals {
            workflow.min_approvals = min_approvals;
        }
        if let Some(roles) = input.required_roles {
            workflow.required_roles = roles;
        }
        if let Some(threshold) = input.amount_threshold {
            workflow.amount_threshold = threshold;
        }
        if let Some(ledger_type) = input.ledger_type {
            workflow.ledger_type = ledger_type;
        }
        if let Some(days) = input.auto_approve_days {
            workflow.auto_approve_days = days;
        }
        if let Some(is_active) = input.is_active {
            workflow.is_active = is_active;
        }
        workflow.validate()?;

        let mut model: ActiveModel = existing.into();
        write_domain(&mut model, &workflow)?;
        if let Some(description) = input.description {
            model.description = Set(description);
        }
        model.updated_at = Set(Utc::now().into());

        let result = model.update(&self.db).await?;
        Ok(result)
    }

    /// Flips `is_active` and returns the updated row.
    pub async fn toggle_workflow(
        &self,
        workflow_id: Uuid,
    ) -> Result<ApprovalWorkflowModel, ApprovalWorkflowError> {
        let existing = self.get_workflow(workflow_id).await?;
        let toggled = to_domain(&existing)?.toggled();

        let mut model: ActiveModel = existing.into();
        model.is_active = Set(toggled.is_active);
        model.updated_at = Set(Utc::now().into());

        let result = model.update(&self.db).await?;
        Ok(result)
    }

    /// Permanently deletes a workflow.
    pub async fn delete_workflow(&self, workflow_id: Uuid) -> Result<(), ApprovalWorkflowError> {
        let existing = self.get_workflow(workflow_id).await?;
        existing.delete(&self.db).await?;
        Ok(())
    }

    /// Active workflows of a type as domain values.
    pub async fn active_workflows(
        &self,
        workflow_type: WorkflowType,
    ) -> Result<Vec<ApprovalWorkflow>, ApprovalWorkflowError> {
        let rows = ApprovalWorkflowEntity::find()
            .filter(approval_workflows::Column::WorkflowType.eq(workflow_type.as_str()))
            .filter(approval_workflows::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;

        rows.iter().map(to_domain).collect()
    }
}

fn write_domain(
    model: &mut ActiveModel,
    workflow: &ApprovalWorkflow,
) -> Result<(), ApprovalWorkflowError> {
    let min_approvals = i32::try_from(workflow.min_approvals).map_err(|_| {
        WorkflowError::InvalidWorkflow("min_approvals is out of range".to_string())
    })?;
    let auto_approve_days = workflow
        .auto_approve_days
        .map(i32::try_from)
        .transpose()
        .map_err(|_| {
            WorkflowError::InvalidWorkflow("auto_approve_days is out of range".to_string())
        })?;
    let roles: Vec<&str> = workflow.required_roles.iter().map(Role::as_str).collect();

    model.id = Set(workflow.id.into_inner());
    model.workflow_name = Set(workflow.workflow_name.clone());
    model.workflow_type = Set(workflow.workflow_type.as_str().to_string());
    model.min_approvals = Set(min_approvals);
    model.required_roles = Set(serde_json::json!(roles));
    model.amount_threshold = Set(workflow.amount_threshold);
    model.ledger_type = Set(workflow.ledger_type.map(|l| l.as_str().to_string()));
    model.auto_approve_days = Set(auto_approve_days);
    model.is_active = Set(workflow.is_active);
    Ok(())
}

/// Converts a stored row into an [`ApprovalWorkflow`].
pub fn to_domain(model: &ApprovalWorkflowModel) -> Result<ApprovalWorkflow, ApprovalWorkflowError> {
    let corrupt = |reason: String| ApprovalWorkflowError::Corrupt {
        id: model.id,
        reason,
    };

    let workflow_type = WorkflowType::parse(&model.workflow_type)
        .ok_or_else(|| corrupt(format!("workflow_type {}", model.workflow_type)))?;
    let min_approvals = u32::try_from(model.min_approvals)
        .map_err(|_| corrupt(format!("min_approvals {}", model.min_approvals)))?;
    let role_names: Vec<String> = serde_json::from_value(model.required_roles.clone())
        .map_err(|e| corrupt(format!("required_roles: {e}")))?;
    let required_roles = role_names
        .iter()
        .map(|r| Role::parse(r).ok_or_else(|| corrupt(format!("role {r}"))))
        .collect::<Result<BTreeSet<_>, _>>()?;
    let ledger_type = model
        .ledger_type
        .as_deref()
        .map(|l| LedgerScope::parse(l).ok_or_else(|| corrupt(format!("ledger_type {l}"))))
        .transpose()?;
    let auto_approve_days = model
        .auto_approve_days
        .map(|d| u32::try_from(d).map_err(|_| corrupt(format!("auto_approve_days {d}"))))
        .transpose()?;

    Ok(ApprovalWorkflow {
        id: ApprovalWorkflowId::from_uuid(model.id),
        workflow_name: model.workflow_name.clone(),
        workflow_type,
        min_approvals,
        required_roles,
        amount_threshold: model.amount_threshold,
        ledger_type,
        auto_approve_days,
        is_active: model.is_active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn model(required_roles: serde_json::Value) -> ApprovalWorkflowModel {
        let now = Utc::now().into();
        ApprovalWorkflowModel {
            id: Uuid::new_v4(),
            workflow_name: "Large operational spend".to_string(),
            workflow_type: "TRANSACTION".to_string(),
            min_approvals: 2,
            required_roles,
            amount_threshold: Some(dec!(5000000)),
            ledger_type: Some("OPERASIONAL".to_string()),
            auto_approve_days: Some(3),
            is_active: true,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_to_domain() {
        let wf = to_domain(&model(json!(["finance_manager", "admin"]))).unwrap();
        assert_eq!(wf.workflow_type, WorkflowType::Transaction);
        assert_eq!(wf.min_approvals, 2);
        assert!(wf.lists_role(Role::FinanceManager));
        assert!(wf.lists_role(Role::Admin));
        assert_eq!(wf.auto_approve_days, Some(3));
        assert!(wf.validate().is_ok());
    }

    #[test]
    fn test_to_domain_rejects_bad_roles() {
        assert!(matches!(
            to_domain(&model(json!(["finance_manager", "owner"]))),
            Err(ApprovalWorkflowError::Corrupt { .. })
        ));
        assert!(matches!(
            to_domain(&model(json!({"role": "admin"}))),
            Err(ApprovalWorkflowError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_write_domain_roundtrips_roles() {
        let wf = to_domain(&model(json!(["admin", "finance_manager"]))).unwrap();
        let mut active = <ActiveModel as Default>::default();
        write_domain(&mut active, &wf).unwrap();

        let sea_orm::ActiveValue::Set(roles) = active.required_roles else {
            panic!("required_roles not set");
        };
        // BTreeSet order follows the Role declaration order
        assert_eq!(roles, json!(["admin", "finance_manager"]));
    }
}
