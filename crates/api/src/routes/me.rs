//! Caller permission introspection.
//!
//! These endpoints never fail on an unresolvable caller; they answer with
//! everything denied instead.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;

use rimba_core::access::{AccessError, EnhancedPermissions, Permission};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the caller introspection routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me/permissions", get(enhanced_permissions))
        .route("/me/permissions/{key}", get(check_permission))
        .route("/me/god-mode", get(god_mode))
}

/// Answer for a single permission key.
#[derive(Debug, Serialize)]
pub struct PermissionCheckResponse {
    /// The key asked about.
    pub permission: Permission,
    /// Whether the caller holds it.
    pub allowed: bool,
}

/// God-mode flags of the caller.
#[derive(Debug, Serialize)]
pub struct GodModeResponse {
    /// Holds the god-mode grant.
    pub god_mode: bool,
    /// Holds the grant and the admin role.
    pub god_admin: bool,
}

/// GET `/me/permissions` - Every permission key with the caller's decision.
async fn enhanced_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Json<EnhancedPermissions> {
    Json(state.oracle.enhanced_permissions(auth.user_id()).await)
}

/// GET `/me/permissions/{key}` - Whether the caller holds one permission.
async fn check_permission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
) -> Result<Json<PermissionCheckResponse>, ApiError> {
    let permission = Permission::parse(&key).ok_or(AccessError::UnknownPermission(key))?;
    let allowed = state.oracle.has_permission(auth.user_id(), permission).await;

    Ok(Json(PermissionCheckResponse {
        permission,
        allowed,
    }))
}

/// GET `/me/god-mode` - God-mode flags of the caller.
async fn god_mode(State(state): State<AppState>, auth: AuthUser) -> Json<GodModeResponse> {
    let user_id = auth.user_id();
    Json(GodModeResponse {
        god_mode: state.oracle.has_god_mode(user_id).await,
        god_admin: state.oracle.is_god_admin(user_id).await,
    })
}
