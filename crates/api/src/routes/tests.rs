//! Router tests that stop before the database.
//!
//! The state carries a disconnected database, so every case here is
//! decided by authentication, the permission matrix or input validation.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rstest::rstest;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use rimba_core::access::{PermissionOracle, Profile, Role, StaticDirectory};
use rimba_core::policy::TransactionPolicy;
use rimba_shared::types::UserId;
use rimba_shared::{JwtConfig, JwtService, PolicyConfig};

use crate::{AppState, create_router};

struct Harness {
    router: Router,
    jwt: Arc<JwtService>,
}

fn profile(role: Role, god_mode: bool, is_active: bool) -> Profile {
    Profile {
        user_id: UserId::new(),
        full_name: format!("{role} user"),
        role,
        god_mode,
        is_active,
    }
}

fn harness(profiles: Vec<Profile>) -> Harness {
    let jwt = Arc::new(JwtService::new(JwtConfig::default()));
    let oracle = PermissionOracle::new(
        Arc::new(StaticDirectory::new(profiles)),
        Duration::ZERO,
    );
    let state = AppState {
        db: Arc::new(DatabaseConnection::Disconnected),
        jwt_service: jwt.clone(),
        oracle,
        policy: TransactionPolicy::default(),
        policy_config: Arc::new(PolicyConfig::default()),
    };
    Harness {
        router: create_router(state),
        jwt,
    }
}

impl Harness {
    fn token(&self, user: UserId) -> String {
        self.jwt
            .generate_access_token(user.into_inner(), None)
            .unwrap()
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let h = harness(vec![]);
    let (status, body) = h.send("GET", "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], false);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let h = harness(vec![]);
    let (status, body) = h.send("GET", "/api/v1/me/permissions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    let h = harness(vec![]);
    let (status, body) = h
        .send("GET", "/api/v1/me/permissions", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_enhanced_permissions_for_viewer() {
    let viewer = profile(Role::Viewer, false, true);
    let h = harness(vec![viewer.clone()]);
    let token = h.token(viewer.user_id);

    let (status, body) = h
        .send("GET", "/api/v1/me/permissions", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["FINANCIAL_VIEW"], true);
    assert_eq!(body["FINANCIAL_BUDGET_MANAGE"], false);
    assert_eq!(body["GOD_MODE"], false);
}

#[tokio::test]
async fn test_unknown_caller_gets_everything_denied() {
    let h = harness(vec![]);
    let token = h.token(UserId::new());

    let (status, body) = h
        .send("GET", "/api/v1/me/permissions", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let map = body.as_object().unwrap();
    assert!(map.values().all(|v| v == false));
}

#[tokio::test]
async fn test_single_permission_check() {
    let manager = profile(Role::FinanceManager, false, true);
    let h = harness(vec![manager.clone()]);
    let token = h.token(manager.user_id);

    let (status, body) = h
        .send(
            "GET",
            "/api/v1/me/permissions/FINANCIAL_TRANSACTION_APPROVE",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);

    let (status, body) = h
        .send("GET", "/api/v1/me/permissions/LAUNCH_ROCKETS", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "UNKNOWN_PERMISSION");
}

#[rstest]
#[case(Role::Admin, true, true, true)]
#[case(Role::FinanceManager, true, true, false)]
#[case(Role::Admin, false, false, false)]
#[tokio::test]
async fn test_god_mode_flags(
    #[case] role: Role,
    #[case] grant: bool,
    #[case] god_mode: bool,
    #[case] god_admin: bool,
) {
    let user = profile(role, grant, true);
    let h = harness(vec![user.clone()]);
    let token = h.token(user.user_id);

    let (status, body) = h.send("GET", "/api/v1/me/god-mode", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["god_mode"], god_mode);
    assert_eq!(body["god_admin"], god_admin);
}

#[tokio::test]
async fn test_viewer_cannot_create_spending_limit() {
    let viewer = profile(Role::Viewer, false, true);
    let h = harness(vec![viewer.clone()]);
    let token = h.token(viewer.user_id);

    let (status, body) = h
        .send(
            "POST",
            "/api/v1/spending-limits",
            Some(&token),
            Some(json!({
                "role": "finance_operational",
                "limit_type": "PER_TRANSACTION",
                "ledger_type": "OPERASIONAL",
                "limit_amount": "5000000"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "PERMISSION_DENIED");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("FINANCIAL_BUDGET_MANAGE")
    );
}

#[tokio::test]
async fn test_inactive_profile_is_refused() {
    let retired = profile(Role::FinanceManager, false, false);
    let h = harness(vec![retired.clone()]);
    let token = h.token(retired.user_id);

    let (status, body) = h
        .send("GET", "/api/v1/spending-limits", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "PROFILE_INACTIVE");
}

#[tokio::test]
async fn test_delete_requires_id_confirmation() {
    let manager = profile(Role::FinanceManager, false, true);
    let h = harness(vec![manager.clone()]);
    let token = h.token(manager.user_id);
    let id = Uuid::new_v4();

    let (status, body) = h
        .send(
            "DELETE",
            &format!("/api/v1/spending-limits/{id}?confirm=yes"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(body["error"], "CONFIRMATION_REQUIRED");
}

#[tokio::test]
async fn test_console_requires_god_admin() {
    let god_manager = profile(Role::FinanceManager, true, true);
    let h = harness(vec![god_manager.clone()]);
    let token = h.token(god_manager.user_id);

    let (status, body) = h
        .send(
            "POST",
            "/api/v1/admin/query",
            Some(&token),
            Some(json!({ "query": "SELECT 1" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "GOD_ADMIN_REQUIRED");
}

#[tokio::test]
async fn test_console_refuses_mutation_before_database() {
    let admin = profile(Role::Admin, true, true);
    let h = harness(vec![admin.clone()]);
    let token = h.token(admin.user_id);

    let (status, body) = h
        .send(
            "POST",
            "/api/v1/admin/query",
            Some(&token),
            Some(json!({ "query": "DELETE FROM audit_logs" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "NOT_READ_ONLY");
}

#[tokio::test]
async fn test_clear_audit_logs_needs_phrase() {
    let admin = profile(Role::Admin, true, true);
    let h = harness(vec![admin.clone()]);
    let token = h.token(admin.user_id);

    let (status, body) = h
        .send(
            "DELETE",
            "/api/v1/admin/audit-logs",
            Some(&token),
            Some(json!({ "confirm": "yes please" })),
        )
        .await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("CLEAR ALL AUDIT LOGS")
    );
}

#[tokio::test]
async fn test_clear_audit_logs_without_body_needs_phrase() {
    let admin = profile(Role::Admin, true, true);
    let h = harness(vec![admin.clone()]);
    let token = h.token(admin.user_id);

    let (status, body) = h
        .send("DELETE", "/api/v1/admin/audit-logs", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(body["error"], "CONFIRMATION_REQUIRED");
}

#[tokio::test]
async fn test_clear_audit_logs_needs_god_mode() {
    let auditor = profile(Role::FinanceAuditor, false, true);
    let h = harness(vec![auditor.clone()]);
    let token = h.token(auditor.user_id);

    let (status, body) = h
        .send(
            "DELETE",
            "/api/v1/admin/audit-logs",
            Some(&token),
            Some(json!({ "confirm": "CLEAR ALL AUDIT LOGS" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "GOD_MODE_REQUIRED");
}
