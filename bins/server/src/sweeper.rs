//! Periodic auto-approval sweep.
//!
//! Requests are also settled lazily when read or acted on; the sweep makes
//! sure a request nobody looks at still flips on time.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use rimba_core::audit::{AuditAction, AuditEntry, EntityType};
use rimba_core::workflow::ApprovalService;
use rimba_db::repositories::ApprovalRequestError;
use rimba_db::{ApprovalRequestRepository, ApprovalWorkflowRepository, AuditLogRepository};
use rimba_shared::types::ApprovalRequestId;

/// Runs the sweep forever, once per `every`.
pub async fn run(db: DatabaseConnection, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match sweep_once(&db, Utc::now()).await {
            Ok(0) => debug!("No approval requests due"),
            Ok(approved) => info!(approved, "Auto-approval sweep finished"),
            Err(e) => error!(error = %e, "Auto-approval sweep failed"),
        }
    }
}

/// Auto-approves every due request. A request that fails is logged and
/// retried on the next tick.
async fn sweep_once(db: &DatabaseConnection, now: DateTime<Utc>) -> anyhow::Result<usize> {
    let candidates = ApprovalRequestRepository::new(db.clone())
        .auto_approval_candidates()
        .await?;

    let mut approved = 0;
    for id in candidates {
        match settle(db, id, now).await {
            Ok(true) => approved += 1,
            Ok(false) => {}
            Err(e) => error!(request_id = %id, error = %e, "Failed to auto-approve request"),
        }
    }
    Ok(approved)
}

async fn settle(
    db: &DatabaseConnection,
    id: ApprovalRequestId,
    now: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let requests = ApprovalRequestRepository::new(db.clone());
    let mut request = requests.get_request(id.into_inner()).await?;
    let workflow = ApprovalWorkflowRepository::new(db.clone())
        .get_domain(request.workflow_id.into_inner())
        .await?;

    if !ApprovalService::apply_auto_approval(&mut request, &workflow, now) {
        return Ok(false);
    }
    match requests.save_decision(&request, None).await {
        Ok(()) => {}
        Err(ApprovalRequestError::Conflict(_)) => {
            debug!(request_id = %id, "Approval request decided before the sweep reached it");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    }

    let entry = AuditEntry::by_system(
        AuditAction::AutoApprove,
        EntityType::ApprovalRequest,
        Some(id.into_inner()),
        json!({
            "decided_at": request.decided_at,
            "workflow_id": workflow.id,
            "subject_id": request.subject_id,
        }),
    );
    if let Err(e) = AuditLogRepository::new(db.clone()).record(&entry).await {
        error!(request_id = %id, error = %e, "Failed to record auto-approval");
    }

    info!(request_id = %id, decided_at = ?request.decided_at, "Approval request auto-approved");
    Ok(true)
}
