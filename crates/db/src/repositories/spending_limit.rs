//! Spending Limit Repository
//!
//! Provides CRUD operations for spending limit rows and converts them into
//! the [`SpendingLimit`] values the policy engine evaluates.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use thiserror::Error;
use uuid::Uuid;

use rimba_core::access::Role;
use rimba_core::spending::{
    LedgerScope, LimitType, SpendingError, SpendingLimit, validate_limit_amount,
};
use rimba_shared::types::{Currency, SpendingLimitId, UserId};

use crate::entities::spending_limits::{
    self, ActiveModel, Entity as SpendingLimitEntity, Model as SpendingLimitModel,
};

/// Errors that can occur during spending limit operations.
#[derive(Debug, Error)]
pub enum SpendingLimitError {
    /// Spending limit not found.
    #[error("Spending limit {0} not found")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The row violates a spending rule.
    #[error(transparent)]
    Invalid(#[from] SpendingError),

    /// A stored row cannot be read back as a domain value.
    #[error("Stored spending limit {id} is malformed: {reason}")]
    Corrupt {
        /// Row id.
        id: Uuid,
        /// What failed to parse.
        reason: String,
    },
}

/// Input for creating a spending limit.
#[derive(Debug, Clone)]
pub struct CreateSpendingLimitInput {
    /// Role the limit applies to.
    pub role: Role,
    /// Kind of limit.
    pub limit_type: LimitType,
    /// Ledger scope; `None` applies to every ledger.
    pub ledger_type: Option<LedgerScope>,
    /// Limit amount (non-negative).
    pub limit_amount: Decimal,
    /// Currency of the limit.
    pub currency: Currency,
    /// Optional description.
    pub description: Option<String>,
    /// Creator.
    pub created_by: Option<UserId>,
}

/// Input for updating a spending limit.
#[derive(Debug, Clone, Default)]
pub struct UpdateSpendingLimitInput {
    /// New role.
    pub role: Option<Role>,
    /// New limit type.
    pub limit_type: Option<LimitType>,
    /// New ledger scope.
    pub ledger_type: Option<Option<LedgerScope>>,
    /// New amount.
    pub limit_amount: Option<Decimal>,
    /// New currency.
    pub currency: Option<Currency>,
    /// New description.
    pub description: Option<Option<String>>,
    /// Active status.
    pub is_active: Option<bool>,
}

/// Repository for spending limit operations.
pub struct SpendingLimitRepository {
    db: DatabaseConnection,
}

impl SpendingLimitRepository {
    /// Creates a new SpendingLimitRepository.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new spending limit.
    pub async fn create_limit(
        &self,
        input: CreateSpendingLimitInput,
    ) -> Result<SpendingLimitModel, SpendingLimitError> {
        validate_limit_amount(input.limit_amount)?;

        let now = Utc::now();
        let limit = ActiveModel {
            id: Set(Uuid::new_v4()),
            role: Set(input.role.as_str().to_string()),
            limit_type: Set(input.limit_type.as_str().to_string()),
            ledger_type: Set(input.ledger_type.map(|l| l.as_str().to_string())),
            limit_amount: Set(input.limit_amount),
            currency: Set(input.currency.as_str().to_string()),
            is_active: Set(true),
            description: Set(input.description),
            created_by: Set(input.created_by.map(UserId::into_inner)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let result = limit.insert(&self.db).await?;
        Ok(result)
    }

    /// Lists spending limits, newest first.
    pub async fn list_limits(
        &self,
        active_only: bool,
    ) -> Result<Vec<SpendingLimitModel>, SpendingLimitError> {
        let mut query = SpendingLimitEntity::find();
        if active_only {
            query = query.filter(spending_limits::Column::IsActive.eq(true));
        }
        let limits = query
            .order_by_desc(spending_limits::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(limits)
    }

    /// Gets a specific spending limit by ID.
    pub async fn get_limit(&self, limit_id: Uuid) -> Result<SpendingLimitModel, SpendingLimitError> {
        SpendingLimitEntity::find_by_id(limit_id)
            .one(&self.db)
            .await?
            .ok_or(SpendingLimitError::NotFound(limit_id))
    }

    /// Updates a spending limit.
    pub async fn update_limit(
        &self,
        limit_id: Uuid,
        input: UpdateSpendingLimitInput,
    ) -> Result<SpendingLimitModel, SpendingLimitError> {
        let existing = self.get_limit(limit_id).await?;

        let mut limit: ActiveModel = existing.into();

        if let Some(role) = input.role {
            limit.role = Set(role.as_str().to_string());
        }
        if let Some(limit_type) = input.limit_type {
            limit.limit_type = Set(limit_type.as_str().to_string());
        }
        if let Some(ledger_type) = input.ledger_type {
            limit.ledger_type = Set(ledger_type.map(|l| l.as_str().to_string()));
        }
        if let Some(amount) = input.limit_amount {
            validate_limit_amount(amount)?;
            limit.limit_amount = Set(amount);
        }
        if let Some(currency) = input.currency {
            limit.currency = Set(currency.as_str().to_string());
        }
        if let Some(description) = input.description {
            limit.description = Set(description);
        }
        if let Some(is_active) = input.is_active {
            limit.is_active = Set(is_active);
        }

        limit.updated_at = Set(Utc::now().into());

        let result = limit.update(&self.db).await?;
        Ok(result)
    }

    /// Flips `is_active` and returns the updated row.
    pub async fn toggle_limit(
        &self,
        limit_id: Uuid,
    ) -> Result<SpendingLimitModel, SpendingLimitError> {
        let existing = self.get_limit(limit_id).await?;
        let toggled = to_domain(&existing)?.toggled();

        let mut limit: ActiveModel = existing.into();
        limit.is_active = Set(toggled.is_active);
        limit.updated_at = Set(Utc::now().into());

        let result = limit.update(&self.db).await?;
        Ok(result)
    }

    /// Permanently deletes a spending limit.
    pub async fn delete_limit(&self, limit_id: Uuid) -> Result<(), SpendingLimitError> {
        let existing = self.get_limit(limit_id).await?;
        existing.delete(&self.db).await?;
        Ok(())
    }

    /// Active limits for a role as domain values.
    pub async fn active_limits_for_role(
        &self,
        role: Role,
    ) -> Result<Vec<SpendingLimit>, SpendingLimitError> {
        let rows = SpendingLimitEntity::find()
            .filter(spending_limits::Column::Role.eq(role.as_str()))
            .filter(spending_limits::Column::IsActive.eq(true))
            .all(&self.db)
            .await?;

        rows.iter().map(to_domain).collect()
    }
}

/// Converts a stored row into a [`SpendingLimit`].
pub fn to_domain(model: &SpendingLimitModel) -> Result<SpendingLimit, SpendingLimitError> {
    let corrupt = |reason: String| SpendingLimitError::Corrupt {
        id: model.id,
        reason,
    };

    let role = Role::parse(&model.role).ok_or_else(|| corrupt(format!("role {}", model.role)))?;
    let limit_type = LimitType::parse(&model.limit_type)
        .ok_or_else(|| corrupt(format!("limit_type {}", model.limit_type)))?;
    let ledger_type = model
        .ledger_type
        .as_deref()
        .map(|l| LedgerScope::parse(l).ok_or_else(|| corrupt(format!("ledger_type {l}"))))
        .transpose()?;
    let currency: Currency = model.currency.parse().map_err(corrupt)?;

    Ok(SpendingLimit {
        id: SpendingLimitId::from_uuid(model.id),
        role,
        limit_type,
        ledger_type,
        limit_amount: model.limit_amount,
        currency,
        is_active: model.is_active,
    })
}
