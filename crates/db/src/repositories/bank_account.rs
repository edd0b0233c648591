//! Bank Account Repository
//!
//! Manages the payee whitelist. Verification decisions go through the
//! [`BankAccount`] state machine before they are written.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use thiserror::Error;
use uuid::Uuid;

use rimba_core::payee::{BankAccount, PayeeError, VerificationStatus, validate_account_fields};
use rimba_shared::types::{BankAccountId, UserId};

use crate::entities::bank_accounts::{
    self, ActiveModel, Entity as BankAccountEntity, Model as BankAccountModel,
};

/// Errors that can occur during bank account operations.
#[derive(Debug, Error)]
pub enum BankAccountError {
    /// Bank account not found.
    #[error("Bank account {0} not found")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The account or decision violates a whitelist rule.
    #[error(transparent)]
    Invalid(#[from] PayeeError),

    /// A stored row cannot be read back as a domain value.
    #[error("Stored bank account {id} has unknown status {status}")]
    Corrupt {
        /// Row id.
        id: Uuid,
        /// The stored status.
        status: String,
    },
}

/// Input for registering a bank account.
#[derive(Debug, Clone)]
pub struct CreateBankAccountInput {
    /// Account number.
    pub account_number: String,
    /// Account holder name.
    pub account_name: String,
    /// Bank name.
    pub bank_name: String,
    /// Initial status; `PENDING` when not given.
    pub verification_status: Option<VerificationStatus>,
    /// Notes on the initial status.
    pub verification_notes: Option<String>,
    /// Creator.
    pub created_by: Option<UserId>,
}

/// Input for editing a bank account's identifying fields.
#[derive(Debug, Clone, Default)]
pub struct UpdateBankAccountInput {
    /// New account number.
    pub account_number: Option<String>,
    /// New holder name.
    pub account_name: Option<String>,
    /// New bank name.
    pub bank_name: Option<String>,
    /// Active status.
    pub is_active: Option<bool>,
}

/// Repository for bank account operations.
pub struct BankAccountRepository {
    db: DatabaseConnection,
}

impl BankAccountRepository {
    /// Creates a new BankAccountRepository.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a bank account.
    ///
    /// An explicit non-pending status counts as a decision by the creator.
    pub async fn create_account(
        &self,
        input: CreateBankAccountInput,
    ) -> Result<BankAccountModel, BankAccountError> {
        validate_account_fields(&input.account_number, &input.account_name, &input.bank_name)?;

        let now = Utc::now();
        let status = input.verification_status.unwrap_or_default();
        let decided = status != VerificationStatus::Pending;

        let account = ActiveModel {
            id: Set(Uuid::new_v4()),
            account_number: Set(input.account_number.trim().to_string()),
            account_name: Set(input.account_name.trim().to_string()),
            bank_name: Set(input.bank_name.trim().to_string()),
            verification_status: Set(status.as_str().to_string()),
            verification_notes: Set(input.verification_notes),
            verified_by: Set(input
                .created_by
                .filter(|_| decided)
                .map(UserId::into_inner)),
            verified_at: Set(decided.then(|| now.into())),
            is_active: Set(true),
            created_by: Set(input.created_by.map(UserId::into_inner)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let result = account.insert(&self.db).await?;
        Ok(result)
    }

    /// Lists bank accounts, optionally filtered by status.
    pub async fn list_accounts(
        &self,
        status: Option<VerificationStatus>,
    ) -> Result<Vec<BankAccountModel>, BankAccountError> {
        let mut query = BankAccountEntity::find();
        if let Some(status) = status {
            query = query.filter(bank_accounts::Column::VerificationStatus.eq(status.as_str()));
        }
        let accounts = query
            .order_by_asc(bank_accounts::Column::AccountName)
            .all(&self.db)
            .await?;

        Ok(accounts)
    }

    /// Gets a specific bank account by ID.
    pub async fn get_account(&self, account_id: Uuid) -> Result<BankAccountModel, BankAccountError> {
        BankAccountEntity::find_by_id(account_id)
            .one(&self.db)
            .await?
            .ok_or(BankAccountError::NotFound(account_id))
    }

    /// Looks up a payee as a domain value; `None` when absent.
    pub async fn find_payee(
        &self,
        account_id: BankAccountId,
    ) -> Result<Option<BankAccount>, BankAccountError> {
        BankAccountEntity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await?
            .as_ref()
            .map(to_domain)
            .transpose()
    }

    /// Edits identifying fields. Status changes go through [`Self::verify_account`].
    ///
    /// Changing the number, holder name or bank sends the account back to
    /// `PENDING` review.
    pub async fn update_account(
        &self,
        account_id: Uuid,
        input: UpdateBankAccountInput,
    ) -> Result<BankAccountModel, BankAccountError> {
        let existing = self.get_account(account_id).await?;

        validate_account_fields(
            input
                .account_number
                .as_deref()
                .unwrap_or(&existing.account_number),
            input
                .account_name
                .as_deref()
                .unwrap_or(&existing.account_name),
            input.bank_name.as_deref().unwrap_or(&existing.bank_name),
        )?;

        let mut domain = to_domain(&existing)?;
        let identity_changed = domain.edit_identity(
            input.account_number.as_deref(),
            input.account_name.as_deref(),
            input.bank_name.as_deref(),
        );

        let mut account: ActiveModel = existing.into();

        if identity_changed {
            account.account_number = Set(domain.account_number);
            account.account_name = Set(domain.account_name);
            account.bank_name = Set(domain.bank_name);
            account.verification_status = Set(domain.verification_status.as_str().to_string());
            account.verification_notes = Set(domain.verification_notes);
            account.verified_by = Set(domain.verified_by.map(UserId::into_inner));
            account.verified_at = Set(domain.verified_at.map(Into::into));
        }
        if let Some(is_active) = input.is_active {
            account.is_active = Set(is_active);
        }

        account.updated_at = Set(Utc::now().into());

        let result = account.update(&self.db).await?;
        Ok(result)
    }

    /// Records a verification decision.
    pub async fn verify_account(
        &self,
        account_id: Uuid,
        to: VerificationStatus,
        reviewer: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<BankAccountModel, BankAccountError> {
        let existing = self.get_account(account_id).await?;
        let mut domain = to_domain(&existing)?;
        domain.apply_verification(to, reviewer, notes, now)?;

        let mut account: ActiveModel = existing.into();
        account.verification_status = Set(domain.verification_status.as_str().to_string());
        account.verification_notes = Set(domain.verification_notes);
        account.verified_by = Set(domain.verified_by.map(UserId::into_inner));
        account.verified_at = Set(domain.verified_at.map(Into::into));
        account.updated_at = Set(now.into());

        let result = account.update(&self.db).await?;
        Ok(result)
    }

    /// Permanently deletes a bank account.
    pub async fn delete_account(&self, account_id: Uuid) -> Result<(), BankAccountError> {
        let existing = self.get_account(account_id).await?;
        existing.delete(&self.db).await?;
        Ok(())
    }
}

/// Converts a stored row into a [`BankAccount`].
pub fn to_domain(model: &BankAccountModel) -> Result<BankAccount, BankAccountError> {
    let verification_status = VerificationStatus::parse(&model.verification_status).ok_or_else(
        || BankAccountError::Corrupt {
            id: model.id,
            status: model.verification_status.clone(),
        },
    )?;

    Ok(BankAccount {
        id: BankAccountId::from_uuid(model.id),
        account_number: model.account_number.clone(),
        account_name: model.account_name.clone(),
        bank_name: model.bank_name.clone(),
        verification_status,
        verification_notes: model.verification_notes.clone(),
        verified_by: model.verified_by.map(UserId::from_uuid),
        verified_at: model.verified_at.map(|t| t.with_timezone(&Utc)),
        is_active: model.is_active,
    })
}
