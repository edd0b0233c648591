//! Bank account whitelist routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use rimba_core::access::{Permission, PermissionMatrix};
use rimba_core::audit::{AuditAction, AuditEntry, EntityType, require_confirmation};
use rimba_core::payee::{BankAccount, VerificationStatus};
use rimba_db::entities::bank_accounts::Model as BankAccountModel;
use rimba_db::repositories::bank_account::{
    BankAccountRepository, CreateBankAccountInput, UpdateBankAccountInput, to_domain,
};

use super::{ConfirmQuery, record_audit};
use crate::{AppState, error::ApiError, middleware::Caller};

/// Creates the bank account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bank-accounts", get(list_accounts).post(create_account))
        .route(
            "/bank-accounts/{account_id}",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route(
            "/bank-accounts/{account_id}/verification",
            post(verify_account),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing accounts.
#[derive(Debug, Default, Deserialize)]
pub struct ListAccountsQuery {
    /// Only accounts in this status.
    pub status: Option<VerificationStatus>,
}

/// Request body for registering a bank account.
#[derive(Debug, Deserialize)]
pub struct CreateBankAccountRequest {
    /// Account number.
    pub account_number: String,
    /// Account holder name.
    pub account_name: String,
    /// Bank name.
    pub bank_name: String,
    /// Initial status; `PENDING` when omitted.
    pub verification_status: Option<VerificationStatus>,
    /// Notes on the initial status.
    pub verification_notes: Option<String>,
}

/// Request body for editing a bank account.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBankAccountRequest {
    /// New account number.
    pub account_number: Option<String>,
    /// New holder name.
    pub account_name: Option<String>,
    /// New bank name.
    pub bank_name: Option<String>,
    /// Active status.
    pub is_active: Option<bool>,
}

/// Request body for a verification decision.
#[derive(Debug, Deserialize)]
pub struct VerifyBankAccountRequest {
    /// Target status.
    pub status: VerificationStatus,
    /// Reviewer notes.
    pub notes: Option<String>,
}

/// Response for a bank account.
#[derive(Debug, Serialize)]
pub struct BankAccountResponse {
    /// The account as the payee check sees it.
    #[serde(flatten)]
    pub account: BankAccount,
    /// Creator.
    pub created_by: Option<Uuid>,
    /// Created at timestamp.
    pub created_at: DateTime<Utc>,
    /// Updated at timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BankAccountModel> for BankAccountResponse {
    type Error = ApiError;

    fn try_from(model: BankAccountModel) -> Result<Self, Self::Error> {
        Ok(Self {
            account: to_domain(&model)?,
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        })
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/bank-accounts` - List whitelisted accounts.
async fn list_accounts(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListAccountsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialView)?;

    let repo = BankAccountRepository::new((*state.db).clone());
    let items = repo
        .list_accounts(query.status)
        .await?
        .into_iter()
        .map(BankAccountResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(json!({ "data": items })))
}

/// GET `/bank-accounts/{account_id}` - Get one account.
async fn get_account(
    State(state): State<AppState>,
    caller: Caller,
    Path(account_id): Path<Uuid>,
) -> Result<Json<BankAccountResponse>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialView)?;

    let repo = BankAccountRepository::new((*state.db).clone());
    let model = repo.get_account(account_id).await?;
    Ok(Json(model.try_into()?))
}

/// POST `/bank-accounts` - Register an account.
///
/// Setting an initial status other than `PENDING` is a verification
/// decision and additionally needs `FINANCIAL_BANK_ACCOUNT_VERIFY`.
async fn create_account(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateBankAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialBankAccountManage)?;
    if payload
        .verification_status
        .is_some_and(|s| s != VerificationStatus::Pending)
    {
        PermissionMatrix::require(caller.ctx(), Permission::FinancialBankAccountVerify)?;
    }

    let repo = BankAccountRepository::new((*state.db).clone());
    let model = repo
        .create_account(CreateBankAccountInput {
            account_number: payload.account_number,
            account_name: payload.account_name,
            bank_name: payload.bank_name,
            verification_status: payload.verification_status,
            verification_notes: payload.verification_notes,
            created_by: Some(caller.user_id()),
        })
        .await?;

    info!(
        account_id = %model.id,
        bank_name = %model.bank_name,
        status = %model.verification_status,
        "Bank account registered"
    );
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Create,
            EntityType::BankAccount,
            Some(model.id),
            json!({
                "bank_name": model.bank_name,
                "account_name": model.account_name,
                "verification_status": model.verification_status,
            }),
        ),
    )
    .await;

    let response = BankAccountResponse::try_from(model)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// PATCH `/bank-accounts/{account_id}` - Edit identifying fields.
async fn update_account(
    State(state): State<AppState>,
    caller: Caller,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<UpdateBankAccountRequest>,
) -> Result<Json<BankAccountResponse>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialBankAccountManage)?;

    let repo = BankAccountRepository::new((*state.db).clone());
    let before = repo.get_account(account_id).await?;
    let model = repo
        .update_account(
            account_id,
            UpdateBankAccountInput {
                account_number: payload.account_number,
                account_name: payload.account_name,
                bank_name: payload.bank_name,
                is_active: payload.is_active,
            },
        )
        .await?;

    info!(account_id = %account_id, user_id = %caller.user_id(), "Bank account updated");
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Update,
            EntityType::BankAccount,
            Some(account_id),
            update_details(&before, &model),
        ),
    )
    .await;

    Ok(Json(model.try_into()?))
}

fn identity(model: &BankAccountModel) -> serde_json::Value {
    json!({
        "account_number": model.account_number,
        "account_name": model.account_name,
        "bank_name": model.bank_name,
        "verification_status": model.verification_status,
    })
}

/// Audit details for an edit: identifying fields before and after.
fn update_details(before: &BankAccountModel, after: &BankAccountModel) -> serde_json::Value {
    json!({
        "before": identity(before),
        "after": identity(after),
        "is_active": after.is_active,
    })
}

/// POST `/bank-accounts/{account_id}/verification` - Record a verification decision.
async fn verify_account(
    State(state): State<AppState>,
    caller: Caller,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<VerifyBankAccountRequest>,
) -> Result<Json<BankAccountResponse>, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialBankAccountVerify)?;

    let repo = BankAccountRepository::new((*state.db).clone());
    let model = repo
        .verify_account(
            account_id,
            payload.status,
            caller.user_id(),
            payload.notes,
            Utc::now(),
        )
        .await?;

    info!(
        account_id = %account_id,
        status = %payload.status,
        reviewer = %caller.user_id(),
        "Bank account verification recorded"
    );
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Verify,
            EntityType::BankAccount,
            Some(account_id),
            json!({
                "status": payload.status,
                "notes": model.verification_notes,
            }),
        ),
    )
    .await;

    Ok(Json(model.try_into()?))
}

/// DELETE `/bank-accounts/{account_id}?confirm={account_id}` - Remove an account.
async fn delete_account(
    State(state): State<AppState>,
    caller: Caller,
    Path(account_id): Path<Uuid>,
    Query(query): Query<ConfirmQuery>,
) -> Result<StatusCode, ApiError> {
    PermissionMatrix::require(caller.ctx(), Permission::FinancialBankAccountManage)?;
    require_confirmation(query.confirm.as_deref(), &account_id.to_string())?;

    let repo = BankAccountRepository::new((*state.db).clone());
    repo.delete_account(account_id).await?;

    info!(account_id = %account_id, user_id = %caller.user_id(), "Bank account deleted");
    record_audit(
        &state,
        AuditEntry::by_user(
            caller.user_id(),
            AuditAction::Delete,
            EntityType::BankAccount,
            Some(account_id),
            json!({}),
        ),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
