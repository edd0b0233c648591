//! Approval Request Repository
//!
//! Persists approval requests and their actions. Decisions are written in
//! one database transaction together with the status of the subject they
//! decide.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::Expr,
};
use thiserror::Error;
use uuid::Uuid;

use rimba_core::access::Role;
use rimba_core::spending::LedgerType;
use rimba_core::workflow::{
    ApprovalAction, ApprovalRequest, ApprovalStatus, Decision, WorkflowType,
};
use rimba_shared::types::{ApprovalRequestId, ApprovalWorkflowId, Currency, Money, UserId};

use crate::entities::{
    approval_actions, approval_requests,
    approval_requests::{Entity as ApprovalRequestEntity, Model as ApprovalRequestModel},
    approval_workflows, financial_transactions,
};

/// Errors that can occur during approval request operations.
#[derive(Debug, Error)]
pub enum ApprovalRequestError {
    /// Request not found.
    #[error("Approval request {0} not found")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The request was decided or acted on since it was loaded.
    #[error("Approval request {0} changed since it was loaded")]
    Conflict(Uuid),

    /// A stored row cannot be read back as a domain value.
    #[error("Stored approval request {id} is malformed: {reason}")]
    Corrupt {
        /// Row id.
        id: Uuid,
        /// What failed to parse.
        reason: String,
    },
}

/// Filter for listing approval requests.
#[derive(Debug, Clone, Default)]
pub struct ApprovalRequestFilter {
    /// Only requests in this status.
    pub status: Option<ApprovalStatus>,
    /// Only requests submitted by this user.
    pub submitted_by: Option<UserId>,
}

/// Repository for approval request operations.
pub struct ApprovalRequestRepository {
    db: DatabaseConnection,
}

impl ApprovalRequestRepository {
    /// Creates a new ApprovalRequestRepository.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists requests, newest first, with the total count for pagination.
    pub async fn list_requests(
        &self,
        filter: &ApprovalRequestFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<ApprovalRequestModel>, u64), ApprovalRequestError> {
        let mut query = ApprovalRequestEntity::find();
        if let Some(status) = filter.status {
            query = query.filter(approval_requests::Column::Status.eq(status.as_str()));
        }
        if let Some(user) = filter.submitted_by {
            query = query.filter(approval_requests::Column::SubmittedBy.eq(user.into_inner()));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(approval_requests::Column::SubmittedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Loads a request together with its actions.
    pub async fn get_request(
        &self,
        request_id: Uuid,
    ) -> Result<ApprovalRequest, ApprovalRequestError> {
        let row = ApprovalRequestEntity::find_by_id(request_id)
            .one(&self.db)
            .await?
            .ok_or(ApprovalRequestError::NotFound(request_id))?;

        let actions = approval_actions::Entity::find()
            .filter(approval_actions::Column::RequestId.eq(request_id))
            .order_by_asc(approval_actions::Column::ActedAt)
            .all(&self.db)
            .await?;

        to_domain(&row, &actions)
    }

    /// Pending requests without any action whose workflow has an
    /// auto-approval timer. The caller decides which of them are due.
    pub async fn auto_approval_candidates(
        &self,
    ) -> Result<Vec<ApprovalRequestId>, ApprovalRequestError> {
        let ids: Vec<Uuid> = ApprovalRequestEntity::find()
            .select_only()
            .column(approval_requests::Column::Id)
            .inner_join(approval_workflows::Entity)
            .filter(approval_requests::Column::Status.eq(ApprovalStatus::Pending.as_str()))
            .filter(approval_workflows::Column::AutoApproveDays.is_not_null())
            .filter(
                approval_requests::Column::Id.not_in_subquery(
                    sea_orm::sea_query::Query::select()
                        .column(approval_actions::Column::RequestId)
                        .from(approval_actions::Entity)
                        .to_owned(),
                ),
            )
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(ids.into_iter().map(ApprovalRequestId::from_uuid).collect())
    }

    /// Writes the current state of a request.
    ///
    /// Inserts `new_action` when given, updates status and decision time,
    /// and moves any transaction routed through the request to the matching
    /// transaction status. All in one database transaction.
    ///
    /// The stored row must still be `PENDING` with exactly the actions
    /// `request` was loaded with; otherwise nothing is written and
    /// [`ApprovalRequestError::Conflict`] is returned.
    pub async fn save_decision(
        &self,
        request: &ApprovalRequest,
        new_action: Option<&ApprovalAction>,
    ) -> Result<(), ApprovalRequestError> {
        let id = request.id.into_inner();
        let txn = self.db.begin().await?;

        // Row lock serializes concurrent decisions on one request.
        let stored = approval_requests::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ApprovalRequestError::NotFound(id))?;
        let stored_actions = approval_actions::Entity::find()
            .filter(approval_actions::Column::RequestId.eq(id))
            .count(&txn)
            .await?;
        let loaded_actions = request
            .actions
            .len()
            .saturating_sub(usize::from(new_action.is_some()));
        if stored.status != ApprovalStatus::Pending.as_str()
            || stored_actions != loaded_actions as u64
        {
            return Err(ApprovalRequestError::Conflict(id));
        }

        if let Some(action) = new_action {
            insert_action(&txn, request.id, action).await?;
        }

        let updated = approval_requests::Entity::update_many()
            .col_expr(
                approval_requests::Column::Status,
                Expr::value(request.status.as_str()),
            )
            .col_expr(
                approval_requests::Column::DecidedAt,
                Expr::value(request.decided_at.map(|t| t.fixed_offset())),
            )
            .col_expr(
                approval_requests::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(approval_requests::Column::Id.eq(id))
            .filter(approval_requests::Column::Status.eq(ApprovalStatus::Pending.as_str()))
            .exec(&txn)
            .await?;
        if updated.rows_affected != 1 {
            return Err(ApprovalRequestError::Conflict(id));
        }

        financial_transactions::Entity::update_many()
            .col_expr(
                financial_transactions::Column::Status,
                Expr::value(request.status.transaction_status().as_str()),
            )
            .filter(financial_transactions::Column::ApprovalRequestId.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }
}

/// Inserts a freshly opened request row.
pub(crate) async fn insert_request<C: ConnectionTrait>(
    conn: &C,
    request: &ApprovalRequest,
) -> Result<ApprovalRequestModel, sea_orm::DbErr> {
    let now = Utc::now();
    approval_requests::ActiveModel {
        id: Set(request.id.into_inner()),
        workflow_id: Set(request.workflow_id.into_inner()),
        subject_type: Set(request.subject_type.as_str().to_string()),
        subject_id: Set(request.subject_id),
        amount: Set(request.amount.amount),
        currency: Set(request.amount.currency.as_str().to_string()),
        ledger_type: Set(request.ledger_type.as_str().to_string()),
        submitted_by: Set(request.submitted_by.into_inner()),
        submitted_at: Set(request.submitted_at.into()),
        status: Set(request.status.as_str().to_string()),
        decided_at: Set(request.decided_at.map(Into::into)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await
}

async fn insert_action<C: ConnectionTrait>(
    conn: &C,
    request_id: ApprovalRequestId,
    action: &ApprovalAction,
) -> Result<(), sea_orm::DbErr> {
    approval_actions::ActiveModel {
        id: Set(Uuid::new_v4()),
        request_id: Set(request_id.into_inner()),
        approver_id: Set(action.approver_id.into_inner()),
        approver_role: Set(action.approver_role.as_str().to_string()),
        decision: Set(action.decision.as_str().to_string()),
        note: Set(action.note.clone()),
        acted_at: Set(action.acted_at.into()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Converts stored rows into an [`ApprovalRequest`].
pub fn to_domain(
    row: &ApprovalRequestModel,
    actions: &[approval_actions::Model],
) -> Result<ApprovalRequest, ApprovalRequestError> {
    let corrupt = |reason: String| ApprovalRequestError::Corrupt { id: row.id, reason };

    let subject_type = WorkflowType::parse(&row.subject_type)
        .ok_or_else(|| corrupt(format!("subject_type {}", row.subject_type)))?;
    let ledger_type = LedgerType::parse(&row.ledger_type)
        .ok_or_else(|| corrupt(format!("ledger_type {}", row.ledger_type)))?;
    let currency: Currency = row.currency.parse().map_err(corrupt)?;
    let status = ApprovalStatus::parse(&row.status)
        .ok_or_else(|| corrupt(format!("status {}", row.status)))?;

    let actions = actions
        .iter()
        .map(|a| -> Result<ApprovalAction, ApprovalRequestError> {
            Ok(ApprovalAction {
                approver_id: UserId::from_uuid(a.approver_id),
                approver_role: Role::parse(&a.approver_role)
                    .ok_or_else(|| corrupt(format!("approver_role {}", a.approver_role)))?,
                decision: Decision::parse(&a.decision)
                    .ok_or_else(|| corrupt(format!("decision {}", a.decision)))?,
                note: a.note.clone(),
                acted_at: a.acted_at.with_timezone(&Utc),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ApprovalRequest {
        id: ApprovalRequestId::from_uuid(row.id),
        workflow_id: ApprovalWorkflowId::from_uuid(row.workflow_id),
        subject_type,
        subject_id: row.subject_id,
        amount: Money::new(row.amount, currency),
        ledger_type,
        submitted_by: UserId::from_uuid(row.submitted_by),
        submitted_at: row.submitted_at.with_timezone(&Utc),
        status,
        decided_at: row.decided_at.map(|t| t.with_timezone(&Utc)),
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(status: &str) -> ApprovalRequestModel {
        let now = Utc::now().into();
        ApprovalRequestModel {
            id: Uuid::new_v4(),
            workflow_id: Uuid::new_v4(),
            subject_type: "TRANSACTION".to_string(),
            subject_id: Uuid::new_v4(),
            amount: dec!(6000000),
            currency: "IDR".to_string(),
            ledger_type: "OPERASIONAL".to_string(),
            submitted_by: Uuid::new_v4(),
            submitted_at: now,
            status: status.to_string(),
            decided_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn action(request_id: Uuid, role: &str, decision: &str) -> approval_actions::Model {
        approval_actions::Model {
            id: Uuid::new_v4(),
            request_id,
            approver_id: Uuid::new_v4(),
            approver_role: role.to_string(),
            decision: decision.to_string(),
            note: None,
            acted_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_to_domain_with_actions() {
        let r = row("PENDING");
        let actions = vec![action(r.id, "finance_manager", "APPROVE")];
        let request = to_domain(&r, &actions).unwrap();

        assert_eq!(request.status, ApprovalStatus::Pending);
        assert_eq!(request.amount, Money::idr(dec!(6000000)));
        assert_eq!(request.actions.len(), 1);
        assert!(request.approving_roles().contains(&Role::FinanceManager));
    }

    #[test]
    fn test_to_domain_rejects_bad_action() {
        let r = row("PENDING");
        let actions = vec![action(r.id, "finance_manager", "ABSTAIN")];
        assert!(matches!(
            to_domain(&r, &actions),
            Err(ApprovalRequestError::Corrupt { .. })
        ));
    }
}
