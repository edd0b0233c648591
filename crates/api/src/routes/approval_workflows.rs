//! Approval workflow management routes.
//!
//! Workflows are validated server-side on every write: a workflow that
//! could never collect `min_approvals` distinct roles is refused.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use tracing::info;
use uuid::Uuid;

use rimba_core::access::{Permission, PermissionMatrix, Role};
use rimba_core::audit::{AuditAction, AuditEntry, EntityType, require_confirmation};
use rimba_core::spending::LedgerScope;
use rimba_core::workflow::{ApprovalWorkflow, WorkflowType};
use rimba_db::entities::approval_workflows::Model as ApprovalWorkflowModel;
use rimba_db::repositories::approval_workflow::{
    ApprovalWorkflowRepository, CreateApprovalWorkflowInput, UpdateApprovalWorkflowInput,
    to_domain,
};

use super::{ConfirmQuery, record_audit};
use crate::{AppState, error::ApiError, middleware::Caller};

/// Creates the approval workflow routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/approval-workflows",
            get(list_workflows).post(create_workflow),
        )
        .route(
            "/approval-workflows/{workflow_id}",
            get(get_workflow)
                .patch(update_workflow)
                .delete(delete_workflow),
        )
        .route(
            "/approval-workflows/{workflow_id}/toggle",
            post(toggle_workflow),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing workflows.
#[derive(Debug, Default, Deserialize)]
pub struct ListWorkflowsQuery {
    /// Only active workflows.
    #[serde(default)]
    pub active_only: bool,
}

fn default_workflow_type() -> WorkflowType {
    WorkflowType::Transaction
}

/// Request body for creating an approval workflow.
#[derive(Debug, Deserialize)]
pub struct CreateApprovalWorkflowRequest {
    /// Human-readable name.
    pub workflow_name: String,
    /// Kind of request governed; `TRANSACTION` when omitted.
    #[serde(default = "default_workflow_type")]
    pub workflow_type: WorkflowType,
    /// Distinct approving roles needed.
    pub min_approvals: u32,
    /// Roles allowed to act.
    pub required_roles: BTreeSet<Role>,
    /// Applies to amounts at or above this value.
    pub amount_threshold: Option<Decimal>,
    /// Ledger scope; omitted or null means every ledger.
    pub ledger_type: Option<LedgerScope>,
    /// Auto-approve after this many days without any action.
    pub auto_approve_days: Option<u32>,
    /// Optional description.
    pub description: Option<String>,
}

/// Request body for updating an approval workflow.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateApprovalWorkflowRequest {
    /// New name.
    pub workflow_name: Option<String>,
    /// New workflow type.
    pub workflow_type: Option<WorkflowType>,
    /// New approval count.
    pub min_approvals: Option<u32>,
    /// New role list.
    pub required_roles: Option<BTreeSet<Role>>,
    /// New threshold; `null` clears it.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub amount_threshold: Option<Option<Decimal>>,
    /// New ledger scope; `null` clears it.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub ledger_type: Option<Option<LedgerScope>>,
    /// New auto-approval timer; `null` disables it.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub auto_approve_days: Option<Option<u32>>,
    /// New description.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    /// Active status.
    pub is_active: Option<bool>,
}

/// Response for an approval workflow.
#[derive(Debug, Serialize)]
pub struct ApprovalWorkflowResponse {
    /// The workflow as the approval engine sees it.
    #[serde(flatten)]
    pub workflow: ApprovalWorkflow,
    /// Description.
    pub description: Option<String>,
    /// Created at timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ApprovalWorkflowModel> for ApprovalWorkflowResponse {
    type Error = ApiError;

    fn try_from(model: ApprovalWorkflowModel) -> Result<Self, Self::Error> {
        Ok(Self {
            workflow: to_domain(&model)?,
            description: model.description,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/approval-workflows` - List approval workflows.
async fn list_workflows(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListWorkflowsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialView)?;

    let repo = ApprovalWorkflowRepository::new((*state.db).clone());
    let items = repo
        .list_workflows(query.active_only)
        .await?
        .into_iter()
        .map(ApprovalWorkflowResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(json!({ "data": items })))
}

/// GET `/approval-workflows/{workflow_id}` - Get one workflow.
async fn get_workflow(
    State(state): State<AppState>,
    caller: Caller,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<ApprovalWorkflowResponse>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialView)?;

    let repo = ApprovalWorkflowRepository::new((*state.db).clone());
    let model = repo.get_workflow(workflow_id).await?;
    Ok(Json(model.try_into()?))
}

/// POST `/approval-workflows` - Create a workflow.
async fn create_workflow(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateApprovalWorkflowRequest>,
) -> Result<impl IntoResponse, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::ApprovalWorkflowManage)?;

    let repo = ApprovalWorkflowRepository::new((*state.db).clone());
    let model = repo
        .create_workflow(CreateApprovalWorkflowInput {
            workflow_name: payload.workflow_name,
            workflow_type: payload.workflow_type,
            min_approvals: payload.min_approvals,
            required_roles: payload.required_roles,
            amount_threshold: payload.amount_threshold,
            ledger_type: payload.ledger_type,
            auto_approve_days: payload.auto_approve_days,
            description: payload.description,
        })
        .await?;

    info!(
        workflow_id = %model.id,
        workflow_name = %model.workflow_name,
        min_approvals = model.min_approvals,
        "Approval workflow created"
    );
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Create,
            EntityType::ApprovalWorkflow,
            Some(model.id),
            json!({
                "workflow_name": model.workflow_name,
                "min_approvals": model.min_approvals,
                "required_roles": model.required_roles,
                "amount_threshold": model.amount_threshold,
                "ledger_type": model.ledger_type,
            }),
        ),
    )
    .await;

    let response = ApprovalWorkflowResponse::try_from(model)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// PATCH `/approval-workflows/{workflow_id}` - Update a workflow.
async fn update_workflow(
    State(state): State<AppState>,
    caller: Caller,
    Path(workflow_id): Path<Uuid>,
    Json(payload): Json<UpdateApprovalWorkflowRequest>,
) -> Result<Json<ApprovalWorkflowResponse>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::ApprovalWorkflowManage)?;

    let repo = ApprovalWorkflowRepository::new((*state.db).clone());
    let model = repo
        .update_workflow(
            workflow_id,
            UpdateApprovalWorkflowInput {
                workflow_name: payload.workflow_name,
                workflow_type: payload.workflow_type,
                min_approvals: payload.min_approvals,
                required_roles: payload.required_roles,
                amount_threshold: payload.amount_threshold,
                ledger_type: payload.ledger_type,
                auto_approve_days: payload.auto_approve_days,
                description: payload.description,
                is_active: payload.is_active,
            },
        )
        .await?;

    info!(workflow_id = %workflow_id, user_id = %caller.user_id(), "Approval workflow updated");
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Update,
            EntityType::ApprovalWorkflow,
            Some(workflow_id),
            json!({
                "min_approvals": model.min_approvals,
                "required_roles": model.required_roles,
                "is_active": model.is_active,
            }),
        ),
    )
    .await;

    Ok(Json(model.try_into()?))
}

/// POST `/approval-workflows/{workflow_id}/toggle` - Flip `is_active`.
async fn toggle_workflow(
    State(state): State<AppState>,
    caller: Caller,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<ApprovalWorkflowResponse>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::ApprovalWorkflowManage)?;

    let repo = ApprovalWorkflowRepository::new((*state.db).clone());
    let model = repo.toggle_workflow(workflow_id).await?;

    info!(workflow_id = %workflow_id, is_active = model.is_active, "Approval workflow toggled");
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Toggle,
            EntityType::ApprovalWorkflow,
            Some(workflow_id),
            json!({ "is_active": model.is_active }),
        ),
    )
    .await;

    Ok(Json(model.try_into()?))
}

/// DELETE `/approval-workflows/{workflow_id}?confirm={workflow_id}` - Delete a workflow.
///
/// Refused with 409 while approval requests still reference it.
async fn delete_workflow(
    State(state): State<AppState>,
    caller: Caller,
    Path(workflow_id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::ApprovalWorkflowManage)?;
    require_confirmation(query.confirm.as_deref(), &workflow_id.to_string())?;

    let repo = ApprovalWorkflowRepository::new((*state.db).clone());
    repo.delete_workflow(workflow_id).await?;

    info!(workflow_id = %workflow_id, user_id = %caller.user_id(), "Approval workflow deleted");
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Delete,
            EntityType::ApprovalWorkflow,
            Some(workflow_id),
            json!({}),
        ),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
