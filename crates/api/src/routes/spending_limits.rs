//! Spending limit management routes.

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
use tracing::info;
use uuid::Uuid;

use rimba_core::access::{Permission, PermissionMatrix, Role};
use rimba_core::audit::{AuditAction, AuditEntry, EntityType, require_confirmation};
use rimba_core::spending::{LedgerScope, LimitType, SpendingLimit};
use rimba_db::repositories::spending_limit::{
    CreateSpendingLimitInput, SpendingLimitRepository, UpdateSpendingLimitInput, to_domain,
};
use rimba_db::entities::spending_limits::Model as SpendingLimitModel;
use rimba_shared::types::Currency;

use super::{ConfirmQuery, record_audit};
use crate::{AppState, error::ApiError, middleware::Caller};

/// Either permission lets a caller manage spending limits.
const MANAGE: [Permission; 2] = [
    Permission::FinancialBudgetManage,
    Permission::FinancialTransactionApprove,
];

/// Creates the spending limit routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/spending-limits", get(list_limits).post(create_limit))
        .route(
            "/spending-limits/{limit_id}",
            get(get_limit).patch(update_limit).delete(delete_limit),
        )
        .route("/spending-limits/{limit_id}/toggle", post(toggle_limit))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing limits.
#[derive(Debug, Default, Deserialize)]
pub struct ListLimitsQuery {
    /// Only active limits.
    #[serde(default)]
    pub active_only: bool,
}

/// Request body for creating a spending limit.
#[derive(Debug, Deserialize)]
pub struct CreateSpendingLimitRequest {
    /// Role the limit applies to.
    pub role: Role,
    /// Aggregation type.
    pub limit_type: LimitType,
    /// Ledger scope; omitted or null means every ledger.
    #[serde(default)]
    pub ledger_type: Option<LedgerScope>,
    /// Maximum amount (inclusive).
    pub limit_amount: Decimal,
    /// Currency, IDR when omitted.
    #[serde(default)]
    pub currency: Currency,
    /// Optional description.
    pub description: Option<String>,
}

/// Request body for updating a spending limit.
///
/// Nullable fields distinguish "absent" (keep) from `null` (clear).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSpendingLimitRequest {
    /// New role.
    pub role: Option<Role>,
    /// New aggregation type.
    pub limit_type: Option<LimitType>,
    /// New ledger scope.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub ledger_type: Option<Option<LedgerScope>>,
    /// New amount.
    pub limit_amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<Currency>,
    /// New description.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    /// Active status.
    pub is_active: Option<bool>,
}

/// Response for a spending limit.
#[derive(Debug, Serialize)]
pub struct SpendingLimitResponse {
    /// The limit as the policy engine sees it.
    #[serde(flatten)]
    pub limit: SpendingLimit,
    /// Description.
    pub description: Option<String>,
    /// Creator.
    pub created_by: Option<Uuid>,
    /// Created at timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SpendingLimitModel> for SpendingLimitResponse {
    type Error = ApiError;

    fn try_from(model: SpendingLimitModel) -> Result<Self, Self::Error> {
        Ok(Self {
            limit: to_domain(&model)?,
            description: model.description,
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/spending-limits` - List spending limits.
async fn list_limits(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListLimitsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialView)?;

    let repo = SpendingLimitRepository::new((*state.db).clone());
    let items = repo
        .list_limits(query.active_only)
        .await?
        .into_iter()
        .map(SpendingLimitResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(json!({ "data": items })))
}

/// GET `/spending-limits/{limit_id}` - Get one spending limit.
async fn get_limit(
    State(state): State<AppState>,
    caller: Caller,
    Path(limit_id): Path<Uuid>,
) -> Result<Json<SpendingLimitResponse>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialView)?;

    let repo = SpendingLimitRepository::new((*state.db).clone());
    let model = repo.get_limit(limit_id).await?;
    Ok(Json(model.try_into()?))
}

/// POST `/spending-limits` - Create a spending limit.
async fn create_limit(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateSpendingLimitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    PermissionMatrix::require_any(caller.ctx(), &MANAGE)?;

    let repo = SpendingLimitRepository::new((*state.db).clone());
    let model = repo
        .create_limit(CreateSpendingLimitInput {
            role: payload.role,
            limit_type: payload.limit_type,
            ledger_type: payload.ledger_type,
            limit_amount: payload.limit_amount,
            currency: payload.currency,
            description: payload.description,
            created_by: Some(caller.user_id()),
        })
        .await?;

    info!(
        limit_id = %model.id,
        role = %model.role,
        limit_type = %model.limit_type,
        user_id = %caller.user_id(),
        "Spending limit created"
    );
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Create,
            EntityType::SpendingLimit,
            Some(model.id),
            json!({
                "role": model.role,
                "limit_type": model.limit_type,
                "ledger_type": model.ledger_type,
                "limit_amount": model.limit_amount,
                "currency": model.currency,
            }),
        ),
    )
    .await;

    let response = SpendingLimitResponse::try_from(model)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// PATCH `/spending-limits/{limit_id}` - Update a spending limit.
async fn update_limit(
    State(state): State<AppState>,
    caller: Caller,
    Path(limit_id): Path<Uuid>,
    Json(payload): Json<UpdateSpendingLimitRequest>,
) -> Result<Json<SpendingLimitResponse>, ApiError> {
    PermissionMatrix::require_any(caller.ctx(), &MANAGE)?;

    let repo = SpendingLimitRepository::new((*state.db).clone());
    let model = repo
        .update_limit(
            limit_id,
            UpdateSpendingLimitInput {
                role: payload.role,
                limit_type: payload.limit_type,
                ledger_type: payload.ledger_type,
                limit_amount: payload.limit_amount,
                currency: payload.currency,
                description: payload.description,
                is_active: payload.is_active,
            },
        )
        .await?;

    info!(limit_id = %limit_id, user_id = %caller.user_id(), "Spending limit updated");
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Update,
            EntityType::SpendingLimit,
            Some(limit_id),
            json!({
                "limit_amount": model.limit_amount,
                "is_active": model.is_active,
            }),
        ),
    )
    .await;

    Ok(Json(model.try_into()?))
}

/// POST `/spending-limits/{limit_id}/toggle` - Flip `is_active`.
async fn toggle_limit(
    State(state): State<AppState>,
    caller: Caller,
    Path(limit_id): Path<Uuid>,
) -> Result<Json<SpendingLimitResponse>, ApiError> {
    PermissionMatrix::require_any(caller.ctx(), &MANAGE)?;

    let repo = SpendingLimitRepository::new((*state.db).clone());
    let model = repo.toggle_limit(limit_id).await?;

    info!(limit_id = %limit_id, is_active = model.is_active, "Spending limit toggled");
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Toggle,
            EntityType::SpendingLimit,
            Some(limit_id),
            json!({ "is_active": model.is_active }),
        ),
    )
    .await;

    Ok(Json(model.try_into()?))
}

/// DELETE `/spending-limits/{limit_id}?confirm={limit_id}` - Delete a spending limit.
async fn delete_limit(
    State(state): State<AppState>,
    caller: Caller,
    Path(limit_id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    PermissionMatrix::require_any(caller.ctx(), &MANAGE)?;
    require_confirmation(query.confirm.as_deref(), &limit_id.to_string())?;

    let repo = SpendingLimitRepository::new((*state.db).clone());
    repo.delete_limit(limit_id).await?;

    info!(limit_id = %limit_id, user_id = %caller.user_id(), "Spending limit deleted");
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Delete,
            EntityType::SpendingLimit,
            Some(limit_id),
            json!({}),
        ),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
