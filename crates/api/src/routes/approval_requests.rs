//! Approval request routes.
//!
//! Reading or acting on a request first settles its auto-approval timer,
//! so a request that is already due is decided and persisted before any
//! late action is considered.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use rimba_core::access::{Permission, PermissionMatrix};
use rimba_core::audit::{AuditAction, AuditEntry, EntityType};
use rimba_core::workflow::{
    ApprovalRequest, ApprovalService, ApprovalStatus, ApprovalWorkflow, Decision,
};
use rimba_db::entities::approval_requests::Model as ApprovalRequestModel;
use rimba_db::repositories::approval_request::{
    ApprovalRequestError, ApprovalRequestFilter, ApprovalRequestRepository,
};
use rimba_db::ApprovalWorkflowRepository;
use rimba_shared::types::{PageRequest, PageResponse, UserId};

use super::record_audit;
use crate::{AppState, error::ApiError, middleware::Caller};

/// Creates the approval request routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approval-requests", get(list_requests))
        .route("/approval-requests/{request_id}", get(get_request))
        .route(
            "/approval-requests/{request_id}/approve",
            post(approve_request),
        )
        .route("/approval-requests/{request_id}/reject", post(reject_request))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query filters for listing requests.
#[derive(Debug, Default, Deserialize)]
pub struct ListRequestsQuery {
    /// Only requests in this status.
    pub status: Option<ApprovalStatus>,
    /// Only requests submitted by this user.
    pub submitted_by: Option<Uuid>,
}

/// Request body for approving or rejecting.
#[derive(Debug, Default, Deserialize)]
pub struct DecisionRequest {
    /// Optional note stored with the action.
    #[serde(default)]
    pub note: Option<String>,
}

/// Row in the request list.
#[derive(Debug, Serialize)]
pub struct ApprovalRequestSummary {
    /// Request ID.
    pub id: Uuid,
    /// Governing workflow.
    pub workflow_id: Uuid,
    /// Kind of subject.
    pub subject_type: String,
    /// Subject ID.
    pub subject_id: Uuid,
    /// Amount under approval.
    pub amount: Decimal,
    /// Currency.
    pub currency: String,
    /// Ledger.
    pub ledger_type: String,
    /// Submitter.
    pub submitted_by: Uuid,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Stored status.
    pub status: String,
    /// Decision time.
    pub decided_at: Option<DateTime<Utc>>,
}

impl From<ApprovalRequestModel> for ApprovalRequestSummary {
    fn from(model: ApprovalRequestModel) -> Self {
        Self {
            id: model.id,
            workflow_id: model.workflow_id,
            subject_type: model.subject_type,
            subject_id: model.subject_id,
            amount: model.amount,
            currency: model.currency,
            ledger_type: model.ledger_type,
            submitted_by: model.submitted_by,
            submitted_at: model.submitted_at.with_timezone(&Utc),
            status: model.status,
            decided_at: model.decided_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// A request with its actions and timer.
#[derive(Debug, Serialize)]
pub struct ApprovalRequestResponse {
    /// The request and its actions.
    #[serde(flatten)]
    pub request: ApprovalRequest,
    /// Governing workflow name.
    pub workflow_name: String,
    /// Distinct approving roles needed.
    pub min_approvals: u32,
    /// When the request auto-approves if nobody acts.
    pub auto_approve_at: Option<DateTime<Utc>>,
}

impl ApprovalRequestResponse {
    fn new(request: ApprovalRequest, workflow: &ApprovalWorkflow) -> Self {
        let auto_approve_at = if request.status == ApprovalStatus::Pending
            && request.actions.is_empty()
        {
            ApprovalService::auto_approve_at(&request, workflow)
        } else {
            None
        };
        Self {
            request,
            workflow_name: workflow.workflow_name.clone(),
            min_approvals: workflow.min_approvals,
            auto_approve_at,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Loads a request with its workflow and persists a due auto-approval.
async fn load_settled(
    state: &AppState,
    request_id: Uuid,
) -> Result<(ApprovalRequest, ApprovalWorkflow), ApiError> {
    let repo = ApprovalRequestRepository::new((*state.db).clone());
    let mut request = repo.get_request(request_id).await?;
    let workflow = ApprovalWorkflowRepository::new((*state.db).clone())
        .get_domain(request.workflow_id.into_inner())
        .await?;

    if ApprovalService::apply_auto_approval(&mut request, &workflow, Utc::now()) {
        match repo.save_decision(&request, None).await {
            Ok(()) => {}
            Err(ApprovalRequestError::Conflict(_)) => {
                debug!(request_id = %request_id, "Approval request settled concurrently");
                let current = repo.get_request(request_id).await?;
                return Ok((current, workflow));
            }
            Err(e) => return Err(e.into()),
        }
        info!(request_id = %request_id, "Approval request auto-approved on access");
        record_audit(
            state,
            AuditEntry::by_system(
                AuditAction::AutoApprove,
                EntityType::ApprovalRequest,
                Some(request_id),
                json!({ "decided_at": request.decided_at }),
            ),
        )
        .await;
    }

    Ok((request, workflow))
}

/// Applies a decision by the caller and persists it with its action.
async fn decide(
    state: &AppState,
    caller: &Caller,
    request_id: Uuid,
    decision: Decision,
    note: Option<String>,
) -> Result<ApprovalRequestResponse, ApiError> {
    let (mut request, workflow) = load_settled(state, request_id).await?;

    let now = Utc::now();
    let status = match decision {
        Decision::Approve => {
            ApprovalService::approve(&mut request, &workflow, caller.ctx(), note, now)?
        }
        Decision::Reject => {
            ApprovalService::reject(&mut request, &workflow, caller.ctx(), note, now)?
        }
    };

    let repo = ApprovalRequestRepository::new((*state.db).clone());
    repo.save_decision(&request, request.actions.last()).await?;

    info!(
        request_id = %request_id,
        approver = %caller.user_id(),
        role = %caller.ctx().role,
        decision = decision.as_str(),
        status = %status,
        "Approval action recorded"
    );
    let action = match decision {
        Decision::Approve => AuditAction::Approve,
        Decision::Reject => AuditAction::Reject,
    };
    record_audit(
        state,
        AuditEntry::by_user(
            caller.user_id(),
            action,
            EntityType::ApprovalRequest,
            Some(request_id),
            json!({
                "role": caller.ctx().role,
                "status": status,
                "subject_id": request.subject_id,
            }),
        ),
    )
    .await;

    Ok(ApprovalRequestResponse::new(request, &workflow))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/approval-requests` - List requests, newest first.
async fn list_requests(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageRequest>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<PageResponse<ApprovalRequestSummary>>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialView)?;

    let page = page.normalized();
    let filter = ApprovalRequestFilter {
        status: query.status,
        submitted_by: query.submitted_by.map(UserId::from_uuid),
    };

    let repo = ApprovalRequestRepository::new((*state.db).clone());
    let (rows, total) = repo
        .list_requests(&filter, page.offset(), page.limit())
        .await?;
    let data = rows.into_iter().map(ApprovalRequestSummary::from).collect();

    Ok(Json(PageResponse::new(data, page.page, page.per_page, total)))
}

/// GET `/approval-requests/{request_id}` - Get a request with its actions.
async fn get_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ApprovalRequestResponse>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialView)?;

    let (request, workflow) = load_settled(&state, request_id).await?;
    Ok(Json(ApprovalRequestResponse::new(request, &workflow)))
}

/// POST `/approval-requests/{request_id}/approve` - Approve a request.
///
/// Who may act is decided by the workflow's required roles.
async fn approve_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<ApprovalRequestResponse>, ApiError> {
    decide(&state, &caller, request_id, Decision::Approve, payload.note)
        .await
        .map(Json)
}

/// POST `/approval-requests/{request_id}/reject` - Reject a request.
async fn reject_request(
    State(state): State<AppState>,
    caller: Caller,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> Result<Json<ApprovalRequestResponse>, ApiError> {
    decide(&state, &caller, request_id, Decision::Reject, payload.note)
        .await
        .map(Json)
}
