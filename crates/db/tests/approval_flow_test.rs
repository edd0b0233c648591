//! Integration tests for transactions, approval requests and the audit log.
//!
//! Run with `cargo test -p rimba-db -- --ignored` against a PostgreSQL
//! database named by `DATABASE_URL`.

mod common;

use chrono::{TimeDelta, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use rimba_core::access::{AccessContext, Role};
use rimba_core::audit::{AuditAction, AuditEntry, EntityType};
use rimba_core::console::ReadOnlyQuery;
use rimba_core::spending::{LedgerScope, LedgerType, TransactionStatus};
use rimba_core::workflow::{ApprovalRequest, ApprovalService, ApprovalStatus, WorkflowType};
use rimba_db::repositories::{
    ApprovalRequestError, AuditLogFilter, CreateApprovalWorkflowInput, CreateTransactionInput,
};
use rimba_db::{
    ApprovalRequestRepository, ApprovalWorkflowRepository, AuditLogRepository, ConsoleRepository,
    TransactionRepository,
};
use rimba_shared::types::{Money, TransactionId};

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_transaction_routed_through_approval() {
    let db = common::setup().await;
    let submitter = common::seed_profile(&db, Role::FinanceOperational, false).await;
    let manager = common::seed_profile(&db, Role::FinanceManager, false).await;

    let workflow_model = ApprovalWorkflowRepository::new(db.clone())
        .create_workflow(CreateApprovalWorkflowInput {
            workflow_name: format!("Single sign-off {}", Uuid::new_v4()),
            workflow_type: WorkflowType::Transaction,
            min_approvals: 1,
            required_roles: [Role::FinanceManager].into_iter().collect(),
            amount_threshold: Some(dec!(5000000)),
            ledger_type: Some(LedgerScope::Operasional),
            auto_approve_days: None,
            description: None,
        })
        .await
        .expect("workflow create failed");
    let workflow = rimba_db::repositories::approval_workflow::to_domain(&workflow_model)
        .expect("workflow conversion failed");

    let now = Utc::now();
    let transaction_id = TransactionId::new();
    let request = ApprovalRequest::open(
        &workflow,
        transaction_id.into_inner(),
        Money::idr(dec!(6000000)),
        LedgerType::Operasional,
        submitter,
        now,
    );

    let transactions = TransactionRepository::new(db.clone());
    transactions
        .create_transaction(
            CreateTransactionInput {
                id: transaction_id,
                created_by: submitter,
                actor_role: Role::FinanceOperational,
                ledger_type: LedgerType::Operasional,
                amount: Money::idr(dec!(6000000)),
                payee_account_id: None,
                description: Some("Seedling purchase".to_string()),
                status: TransactionStatus::PendingApproval,
                // backdated business date; history still sees it today
                occurred_at: now - TimeDelta::days(40),
                recorded_at: now,
            },
            Some(&request),
        )
        .await
        .expect("transaction create failed");

    let history = transactions
        .spending_history(submitter, now - TimeDelta::days(1))
        .await
        .expect("history failed");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, TransactionStatus::PendingApproval);

    let requests = ApprovalRequestRepository::new(db.clone());
    let mut loaded = requests
        .get_request(request.id.into_inner())
        .await
        .expect("request load failed");
    assert_eq!(loaded.status, ApprovalStatus::Pending);

    let actor = AccessContext::new(manager, Role::FinanceManager);
    let status = ApprovalService::approve(&mut loaded, &workflow, &actor, None, Utc::now())
        .expect("approve failed");
    assert_eq!(status, ApprovalStatus::Approved);
    requests
        .save_decision(&loaded, loaded.actions.last())
        .await
        .expect("save failed");

    let reloaded = requests
        .get_request(request.id.into_inner())
        .await
        .expect("reload failed");
    assert_eq!(reloaded.status, ApprovalStatus::Approved);
    assert_eq!(reloaded.actions.len(), 1);

    let stored = transactions
        .get_transaction(transaction_id.into_inner())
        .await
        .expect("transaction load failed");
    assert_eq!(stored.status, "APPROVED");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_stale_decision_is_refused() {
    let db = common::setup().await;
    let submitter = common::seed_profile(&db, Role::FinanceOperational, false).await;
    let approver = common::seed_profile(&db, Role::FinanceManager, false).await;
    let rejecter = common::seed_profile(&db, Role::FinanceManager, false).await;

    let workflow_model = ApprovalWorkflowRepository::new(db.clone())
        .create_workflow(CreateApprovalWorkflowInput {
            workflow_name: format!("Single sign-off {}", Uuid::new_v4()),
            workflow_type: WorkflowType::Transaction,
            min_approvals: 1,
            required_roles: [Role::FinanceManager].into_iter().collect(),
            amount_threshold: Some(dec!(5000000)),
            ledger_type: Some(LedgerScope::Operasional),
            auto_approve_days: Some(1),
            description: None,
        })
        .await
        .expect("workflow create failed");
    let workflow = rimba_db::repositories::approval_workflow::to_domain(&workflow_model)
        .expect("workflow conversion failed");

    let now = Utc::now();
    let transaction_id = TransactionId::new();
    let request = ApprovalRequest::open(
        &workflow,
        transaction_id.into_inner(),
        Money::idr(dec!(7500000)),
        LedgerType::Operasional,
        submitter,
        now,
    );
    let transactions = TransactionRepository::new(db.clone());
    transactions
        .create_transaction(
            CreateTransactionInput {
                id: transaction_id,
                created_by: submitter,
                actor_role: Role::FinanceOperational,
                ledger_type: LedgerType::Operasional,
                amount: Money::idr(dec!(7500000)),
                payee_account_id: None,
                description: None,
                status: TransactionStatus::PendingApproval,
                occurred_at: now,
                recorded_at: now,
            },
            Some(&request),
        )
        .await
        .expect("transaction create failed");

    let requests = ApprovalRequestRepository::new(db.clone());
    let id = request.id.into_inner();
    let mut first = requests.get_request(id).await.expect("load failed");
    let mut second = first.clone();
    let mut swept = first.clone();

    ApprovalService::approve(
        &mut first,
        &workflow,
        &AccessContext::new(approver, Role::FinanceManager),
        None,
        Utc::now(),
    )
    .expect("approve failed");
    requests
        .save_decision(&first, first.actions.last())
        .await
        .expect("save failed");

    ApprovalService::reject(
        &mut second,
        &workflow,
        &AccessContext::new(rejecter, Role::FinanceManager),
        Some("Duplicate invoice".to_string()),
        Utc::now(),
    )
    .expect("reject failed");
    let result = requests.save_decision(&second, second.actions.last()).await;
    assert!(matches!(result, Err(ApprovalRequestError::Conflict(c)) if c == id));

    // an auto-approval computed from the same stale copy
    swept.status = ApprovalStatus::Approved;
    swept.decided_at = Some(Utc::now());
    let result = requests.save_decision(&swept, None).await;
    assert!(matches!(result, Err(ApprovalRequestError::Conflict(_))));

    let reloaded = requests.get_request(id).await.expect("reload failed");
    assert_eq!(reloaded.status, ApprovalStatus::Approved);
    assert_eq!(reloaded.actions.len(), 1);
    assert_eq!(reloaded.actions[0].approver_id, approver);

    let stored = transactions
        .get_transaction(transaction_id.into_inner())
        .await
        .expect("transaction load failed");
    assert_eq!(stored.status, "APPROVED");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_console_runs_read_only() {
    let db = common::setup().await;
    let console = ConsoleRepository::new(db);

    let query = ReadOnlyQuery::parse("SELECT generate_series(1, 5) AS n").unwrap();
    let result = console.execute(&query, 3).await.expect("query failed");
    assert_eq!(result.row_count, 3);
    assert!(result.truncated);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_audit_clear_leaves_marker() {
    let db = common::setup().await;
    let admin = common::seed_profile(&db, Role::Admin, true).await;
    let audit = AuditLogRepository::new(db);

    audit
        .record(&AuditEntry::by_user(
            admin,
            AuditAction::Query,
            EntityType::Console,
            None,
            serde_json::json!({ "sql": "SELECT 1" }),
        ))
        .await
        .expect("record failed");

    let removed = audit.clear_all(admin).await.expect("clear failed");
    assert!(removed >= 1);

    let (entries, total) = audit
        .list_entries(&AuditLogFilter::default(), 0, 10)
        .await
        .expect("list failed");
    assert_eq!(total, 1);
    assert_eq!(entries[0].action, "CLEAR");
    assert_eq!(entries[0].actor_id, Some(admin.into_inner()));
}
