//! God-mode administration routes: SQL console and audit log.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use rimba_core::access::{Permission, PermissionMatrix};
use rimba_core::audit::{
    AuditAction, AuditEntry, CLEAR_AUDIT_LOGS_PHRASE, EntityType, require_confirmation,
};
use rimba_core::console::ReadOnlyQuery;
use rimba_db::entities::audit_logs::Model as AuditLogModel;
use rimba_db::repositories::audit_log::AuditLogFilter;
use rimba_db::{AuditLogRepository, ConsoleRepository, repositories::ConsoleResult};
use rimba_shared::types::{PageRequest, PageResponse, UserId};

use super::record_audit;
use crate::{AppState, error::ApiError, middleware::Caller};

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/query", post(run_query))
        .route("/admin/audit-logs", get(list_audit_logs).delete(clear_audit_logs))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the SQL console.
#[derive(Debug, Deserialize)]
pub struct ConsoleRequest {
    /// A single read-only statement.
    pub query: String,
}

/// Query filters for the audit log.
#[derive(Debug, Default, Deserialize)]
pub struct ListAuditLogsQuery {
    /// Only entries by this actor.
    pub actor_id: Option<Uuid>,
    /// Only entries about this entity type.
    pub entity_type: Option<EntityType>,
    /// Only entries about this entity.
    pub entity_id: Option<Uuid>,
}

/// Request body for clearing the audit log.
#[derive(Debug, Default, Deserialize)]
pub struct ClearAuditLogsRequest {
    /// Must equal the clear phrase.
    pub confirm: Option<String>,
}

/// Response for an audit entry.
#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Acting user; absent for system actions.
    pub actor_id: Option<Uuid>,
    /// What happened.
    pub action: String,
    /// Kind of entity touched.
    pub entity_type: String,
    /// Entity touched.
    pub entity_id: Option<Uuid>,
    /// Free-form details.
    pub details: serde_json::Value,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogModel> for AuditLogResponse {
    fn from(model: AuditLogModel) -> Self {
        Self {
            id: model.id,
            actor_id: model.actor_id,
            action: model.action,
            entity_type: model.entity_type,
            entity_id: model.entity_id,
            details: model.details,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Response for a cleared audit log.
#[derive(Debug, Serialize)]
pub struct ClearAuditLogsResponse {
    /// Entries removed.
    pub removed: u64,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/admin/query` - Run a read-only SQL statement.
async fn run_query(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<ConsoleRequest>,
) -> Result<Json<ConsoleResult>, ApiError> {
    PermissionMatrix::require_god_admin(caller.ctx())?;

    let query = ReadOnlyQuery::parse(&payload.query)?;
    let repo = ConsoleRepository::new((*state.db).clone());
    let result = repo
        .execute(&query, state.policy_config.console_row_limit)
        .await
        .map_err(|e| match e {
            DbErr::Query(_) | DbErr::Exec(_) => {
                ApiError::new(400, "QUERY_FAILED", e.to_string())
            }
            other => other.into(),
        })?;

    info!(
        user_id = %caller.user_id(),
        row_count = result.row_count,
        "Console query run"
    );
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Query,
            EntityType::Console,
            None,
            json!({
                "query": query.as_str(),
                "row_count": result.row_count,
                "truncated": result.truncated,
            }),
        ),
    )
    .await;

    Ok(Json(result))
}

/// GET `/admin/audit-logs` - List audit entries, newest first.
async fn list_audit_logs(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageRequest>,
    Query(query): Query<ListAuditLogsQuery>,
) -> Result<Json<PageResponse<AuditLogResponse>>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::AuditLogView)?;

    let page = page.normalized();
    let filter = AuditLogFilter {
        actor_id: query.actor_id.map(UserId::from_uuid),
        entity_type: query.entity_type,
        entity_id: query.entity_id,
    };

    let repo = AuditLogRepository::new((*state.db).clone());
    let (rows, total) = repo
        .list_entries(&filter, page.offset(), page.limit())
        .await?;
    let data = rows.into_iter().map(AuditLogResponse::from).collect();

    Ok(Json(PageResponse::new(data, page.page, page.per_page, total)))
}

/// DELETE `/admin/audit-logs` - Remove every audit entry.
///
/// Requires god mode and `{"confirm": "CLEAR ALL AUDIT LOGS"}`; a missing
/// body is treated as an absent phrase. The clear
/// itself becomes the first entry of the new log.
async fn clear_audit_logs(
    State(state): State<AppState>,
    caller: Caller,
    payload: Option<Json<ClearAuditLogsRequest>>,
) -> Result<Json<ClearAuditLogsResponse>, ApiError> {
    PermissionMatrix::require_god_mode(caller.ctx())?;
    let confirm = payload.and_then(|Json(p)| p.confirm);
    require_confirmation(confirm.as_deref(), CLEAR_AUDIT_LOGS_PHRASE)?;

    let repo = AuditLogRepository::new((*state.db).clone());
    let removed = repo.clear_all(caller.user_id()).await?;

    warn!(user_id = %caller.user_id(), removed, "Audit log cleared");
    Ok(Json(ClearAuditLogsResponse { removed }))
}
