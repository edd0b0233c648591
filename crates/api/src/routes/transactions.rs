//! Financial transaction routes.
//!
//! Every transaction is decided by the transaction policy before it is
//! recorded: booked, routed to an approval request, or refused.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

use rimba_core::access::{AccessContext, Permission, PermissionMatrix};
use rimba_core::audit::{AuditAction, AuditEntry, EntityType};
use rimba_core::policy::{PolicyInputs, PolicyOutcome};
use rimba_core::spending::{LedgerType, TransactionProposal, TransactionStatus};
use rimba_core::workflow::{ApprovalRequest, ApprovalWorkflow, WorkflowType};
use rimba_db::entities::financial_transactions::Model as TransactionModel;
use rimba_db::repositories::transaction::{
    CreateTransactionInput, TransactionFilter, TransactionRepository, total_by_currency,
};
use rimba_db::{ApprovalWorkflowRepository, BankAccountRepository, SpendingLimitRepository};
use rimba_shared::types::{
    BankAccountId, Currency, Money, PageRequest, PageResponse, TransactionId, UserId,
};

use super::record_audit;
use crate::{AppState, error::ApiError, middleware::Caller};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/evaluate", post(evaluate_transaction))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for proposing a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    /// Target ledger.
    pub ledger_type: LedgerType,
    /// Amount.
    pub amount: Decimal,
    /// Currency, IDR when omitted.
    #[serde(default)]
    pub currency: Currency,
    /// Whitelisted payee.
    pub payee_account_id: Option<Uuid>,
    /// Free-text description.
    pub description: Option<String>,
    /// Business date of the spend; now when omitted. Stored only, limits
    /// are always counted in the period containing the server clock.
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TransactionRequest {
    fn proposal(&self, actor: AccessContext, now: DateTime<Utc>) -> TransactionProposal {
        TransactionProposal {
            actor,
            ledger_type: self.ledger_type,
            amount: Money::new(self.amount, self.currency),
            payee_account_id: self.payee_account_id.map(BankAccountId::from_uuid),
            submitted_at: now,
        }
    }
}

/// Query filters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Only transactions by this user.
    pub created_by: Option<Uuid>,
    /// Only transactions in this status.
    pub status: Option<TransactionStatus>,
    /// Only transactions on this ledger.
    pub ledger_type: Option<LedgerType>,
}

/// Response for a recorded transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Creator.
    pub created_by: Uuid,
    /// Creator's role at the time.
    pub actor_role: String,
    /// Ledger.
    pub ledger_type: String,
    /// Amount.
    pub amount: Decimal,
    /// Currency.
    pub currency: String,
    /// Payee.
    pub payee_account_id: Option<Uuid>,
    /// Description.
    pub description: Option<String>,
    /// Current status.
    pub status: String,
    /// Approval request routing it, if any.
    pub approval_request_id: Option<Uuid>,
    /// When the spend happens.
    pub occurred_at: DateTime<Utc>,
    /// Created at timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<TransactionModel> for TransactionResponse {
    fn from(model: TransactionModel) -> Self {
        Self {
            id: model.id,
            created_by: model.created_by,
            actor_role: model.actor_role,
            ledger_type: model.ledger_type,
            amount: model.amount,
            currency: model.currency,
            payee_account_id: model.payee_account_id,
            description: model.description,
            status: model.status,
            approval_request_id: model.approval_request_id,
            occurred_at: model.occurred_at.with_timezone(&Utc),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Response for a created transaction.
#[derive(Debug, Serialize)]
pub struct CreatedTransactionResponse {
    /// The recorded transaction.
    pub transaction: TransactionResponse,
    /// How the policy decided.
    pub policy: PolicyOutcome,
}

/// A page of transactions with per-currency sums of the page.
#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    /// The page.
    #[serde(flatten)]
    pub page: PageResponse<TransactionResponse>,
    /// Sum of amounts in this page by currency.
    pub page_totals: BTreeMap<String, Decimal>,
}

// ============================================================================
// Policy Evaluation
// ============================================================================

/// Loads everything the policy needs and decides on `proposal`.
///
/// Returns the active transaction workflows alongside the outcome so a
/// caller can open the governing request without another lookup.
async fn decide(
    state: &AppState,
    proposal: &TransactionProposal,
) -> Result<(PolicyOutcome, Vec<ApprovalWorkflow>), ApiError> {
    let db = (*state.db).clone();

    let limits = SpendingLimitRepository::new(db.clone())
        .active_limits_for_role(proposal.actor.role)
        .await?;

    // History is only read back as far as the widest period in play.
    let mut since: Option<DateTime<Utc>> = None;
    for limit in &limits {
        if let Some(period) = state
            .policy
            .calendar()
            .period(limit.limit_type, proposal.submitted_at)?
        {
            since = Some(since.map_or(period.start, |s| s.min(period.start)));
        }
    }
    let history = match since {
        Some(since) => {
            TransactionRepository::new(db.clone())
                .spending_history(proposal.actor.user_id, since)
                .await?
        }
        None => Vec::new(),
    };

    let workflows = ApprovalWorkflowRepository::new(db.clone())
        .active_workflows(WorkflowType::Transaction)
        .await?;

    let payee = match proposal.payee_account_id {
        Some(id) => BankAccountRepository::new(db).find_payee(id).await?,
        None => None,
    };

    let outcome = state.policy.evaluate(PolicyInputs {
        proposal,
        limits: &limits,
        history: &history,
        workflows: &workflows,
        payee: payee.as_ref(),
    })?;

    debug!(
        user_id = %proposal.actor.user_id,
        amount = %proposal.amount,
        outcome = outcome.as_str(),
        limits = limits.len(),
        prior = history.len(),
        "Transaction policy evaluated"
    );
    Ok((outcome, workflows))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/transactions/evaluate` - Dry-run the policy without recording anything.
async fn evaluate_transaction(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<TransactionRequest>,
) -> Result<Json<PolicyOutcome>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialTransactionCreate)?;

    let proposal = payload.proposal(*caller.ctx(), Utc::now());
    let (outcome, _) = decide(&state, &proposal).await?;
    Ok(Json(outcome))
}

/// POST `/transactions` - Record a transaction with the policy's decision.
///
/// Refused transactions are recorded as `REJECTED` so the attempt stays
/// visible; they never count toward limits.
async fn create_transaction(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<TransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialTransactionCreate)?;

    let proposal = payload.proposal(*caller.ctx(), Utc::now());
    let (outcome, workflows) = decide(&state, &proposal).await?;

    let transaction_id = TransactionId::new();
    let (status, approval) = match &outcome {
        PolicyOutcome::AutoApproved { .. } => (TransactionStatus::Approved, None),
        PolicyOutcome::RequiresApproval { workflow_id, .. } => {
            let workflow = workflows
                .iter()
                .find(|w| w.id == *workflow_id)
                .ok_or_else(|| ApiError::internal(format!("Workflow {workflow_id} vanished")))?;
            let request = ApprovalRequest::open(
                workflow,
                transaction_id.into_inner(),
                proposal.amount,
                proposal.ledger_type,
                proposal.actor.user_id,
                proposal.submitted_at,
            );
            (TransactionStatus::PendingApproval, Some(request))
        }
        PolicyOutcome::Rejected { .. } => (TransactionStatus::Rejected, None),
    };

    let repo = TransactionRepository::new((*state.db).clone());
    let model = repo
        .create_transaction(
            CreateTransactionInput {
                id: transaction_id,
                created_by: caller.user_id(),
                actor_role: caller.ctx().role,
                ledger_type: proposal.ledger_type,
                amount: proposal.amount,
                payee_account_id: proposal.payee_account_id,
                description: payload.description,
                status,
                occurred_at: payload.occurred_at.unwrap_or(proposal.submitted_at),
                recorded_at: proposal.submitted_at,
            },
            approval.as_ref(),
        )
        .await?;

    info!(
        transaction_id = %model.id,
        user_id = %caller.user_id(),
        amount = %proposal.amount,
        status = %status,
        "Transaction recorded"
    );
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Create,
            EntityType::FinancialTransaction,
            Some(model.id),
            json!({
                "amount": model.amount,
                "currency": model.currency,
                "ledger_type": model.ledger_type,
                "outcome": outcome.as_str(),
                "approval_request_id": model.approval_request_id,
            }),
        ),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(CreatedTransactionResponse {
            transaction: model.into(),
            policy: outcome,
        }),
    ))
}

/// GET `/transactions` - List transactions, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    caller: Caller,
    Query(page): Query<PageRequest>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialView)?;

    let page = page.normalized();
    let filter = TransactionFilter {
        created_by: query.created_by.map(UserId::from_uuid),
        status: query.status,
        ledger_type: query.ledger_type,
    };

    let repo = TransactionRepository::new((*state.db).clone());
    let (rows, total) = repo
        .list_transactions(&filter, page.offset(), page.limit())
        .await?;

    let page_totals = total_by_currency(&rows).into_iter().collect();
    let data = rows.into_iter().map(TransactionResponse::from).collect();

    Ok(Json(TransactionListResponse {
        page: PageResponse::new(data, page.page, page.per_page, total),
        page_totals,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use rimba_core::access::Role;
    use rimba_core::spending::{
        AggregationCalendar, LimitType, PriorTransaction, SpendingEvaluator, SpendingLimit,
    };
    use rimba_shared::types::SpendingLimitId;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn request(occurred_at: Option<DateTime<Utc>>) -> TransactionRequest {
        TransactionRequest {
            ledger_type: LedgerType::Operasional,
            amount: Decimal::new(9_000_000, 0),
            currency: Currency::Idr,
            payee_account_id: None,
            description: None,
            occurred_at,
        }
    }

    #[test]
    fn test_backdated_request_still_counts_against_todays_limit() {
        let actor = AccessContext::new(UserId::new(), Role::FinanceOperational);
        let now = at("2026-03-10T03:00:00Z");

        let proposal = request(Some(at("2026-03-08T03:00:00Z"))).proposal(actor, now);
        assert_eq!(proposal.submitted_at, now);

        let limits = [SpendingLimit {
            id: SpendingLimitId::new(),
            role: Role::FinanceOperational,
            limit_type: LimitType::Daily,
            ledger_type: None,
            limit_amount: Decimal::new(10_000_000, 0),
            currency: Currency::Idr,
            is_active: true,
        }];
        let history = [PriorTransaction {
            created_by: actor.user_id,
            ledger_type: LedgerType::Operasional,
            amount: Money::idr(Decimal::new(10_000_000, 0)),
            status: TransactionStatus::Approved,
            recorded_at: now - TimeDelta::hours(1),
        }];

        let check = SpendingEvaluator::evaluate(
            &limits,
            &proposal,
            &history,
            &AggregationCalendar::default(),
        )
        .unwrap();
        assert_eq!(check.violations.len(), 1);
        assert_eq!(check.violations[0].limit_type, LimitType::Daily);
        assert_eq!(
            check.violations[0].attempted_amount,
            Decimal::new(19_000_000, 0)
        );
    }

    #[test]
    fn test_postdated_request_uses_server_clock() {
        let actor = AccessContext::new(UserId::new(), Role::FinanceOperational);
        let now = at("2026-03-10T03:00:00Z");

        let proposal = request(Some(at("2026-04-02T03:00:00Z"))).proposal(actor, now);
        assert_eq!(proposal.submitted_at, now);
        assert_eq!(proposal.amount, Money::idr(Decimal::new(9_000_000, 0)));
    }
}
