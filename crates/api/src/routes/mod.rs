//! API route definitions.

use axum::{Router, middleware};
use serde::Deserialize;
use tracing::error;

use rimba_core::audit::AuditEntry;
use rimba_db::AuditLogRepository;

use crate::{AppState, middleware::auth_middleware};

pub mod admin;
pub mod approval_requests;
pub mod approval_workflows;
pub mod bank_accounts;
pub mod health;
pub mod me;
pub mod spending_limits;
pub mod transactions;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(me::routes())
        .merge(spending_limits::routes())
        .merge(approval_workflows::routes())
        .merge(bank_accounts::routes())
        .merge(transactions::routes())
        .merge(approval_requests::routes())
        .merge(admin::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}

/// `?confirm=<id>` on resource deletes.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    /// Must equal the id of the resource being deleted.
    pub confirm: Option<String>,
}

/// Appends an audit entry. A failed write is logged and does not fail the
/// request that already took effect.
pub(crate) async fn record_audit(state: &AppState, entry: AuditEntry) {
    let repo = AuditLogRepository::new((*state.db).clone());
    if let Err(e) = repo.record(&entry).await {
        error!(
            error = %e,
            action = %entry.action,
            entity_type = %entry.entity_type,
            "Failed to record audit entry"
        );
    }
}

#[cfg(test)]
mod tests;
