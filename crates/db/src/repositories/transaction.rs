//! Financial Transaction Repository
//!
//! Records transactions with the status decided by the policy engine and
//! serves the spending history the engine aggregates over.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use thiserror::Error;
use uuid::Uuid;

use rimba_core::access::Role;
use rimba_core::spending::{LedgerType, PriorTransaction, TransactionStatus};
use rimba_core::workflow::ApprovalRequest;
use rimba_shared::types::{BankAccountId, Currency, Money, TransactionId, UserId};

use crate::entities::financial_transactions::{
    self, ActiveModel, Entity as TransactionEntity, Model as TransactionModel,
};
use crate::repositories::approval_request::insert_request;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Transaction not found.
    #[error("Transaction {0} not found")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The approval request does not describe this transaction.
    #[error("Approval request subject {subject_id} does not match transaction {transaction_id}")]
    SubjectMismatch {
        /// Transaction id.
        transaction_id: Uuid,
        /// Subject named by the request.
        subject_id: Uuid,
    },

    /// A stored row cannot be read back as a domain value.
    #[error("Stored transaction {id} is malformed: {reason}")]
    Corrupt {
        /// Row id.
        id: Uuid,
        /// What failed to parse.
        reason: String,
    },
}

/// Input for recording a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Pre-allocated id, so an approval request can reference it.
    pub id: TransactionId,
    /// Creator.
    pub created_by: UserId,
    /// Creator's role at the time of creation.
    pub actor_role: Role,
    /// Ledger the money moves on.
    pub ledger_type: LedgerType,
    /// Amount and currency.
    pub amount: Money,
    /// Whitelisted payee.
    pub payee_account_id: Option<BankAccountId>,
    /// Free-text description.
    pub description: Option<String>,
    /// Status decided by the policy engine.
    pub status: TransactionStatus,
    /// Business date of the spend, as reported by the submitter.
    pub occurred_at: DateTime<Utc>,
    /// Server time the transaction was received; spending history is
    /// aggregated on this column.
    pub recorded_at: DateTime<Utc>,
}

/// Filter for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Only transactions by this user.
    pub created_by: Option<UserId>,
    /// Only transactions in this status.
    pub status: Option<TransactionStatus>,
    /// Only transactions on this ledger.
    pub ledger_type: Option<LedgerType>,
}

/// Repository for financial transaction operations.
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a transaction, opening its approval request in the same
    /// database transaction when one is given.
    pub async fn create_transaction(
        &self,
        input: CreateTransactionInput,
        approval: Option<&ApprovalRequest>,
    ) -> Result<TransactionModel, TransactionError> {
        if let Some(request) = approval
            && request.subject_id != input.id.into_inner()
        {
            return Err(TransactionError::SubjectMismatch {
                transaction_id: input.id.into_inner(),
                subject_id: request.subject_id,
            });
        }

        let txn = self.db.begin().await?;

        if let Some(request) = approval {
            insert_request(&txn, request).await?;
        }

        let transaction = ActiveModel {
            id: Set(input.id.into_inner()),
            created_by: Set(input.created_by.into_inner()),
            actor_role: Set(input.actor_role.as_str().to_string()),
            ledger_type: Set(input.ledger_type.as_str().to_string()),
            amount: Set(input.amount.amount),
            currency: Set(input.amount.currency.as_str().to_string()),
            payee_account_id: Set(input.payee_account_id.map(BankAccountId::into_inner)),
            description: Set(input.description),
            status: Set(input.status.as_str().to_string()),
            approval_request_id: Set(approval.map(|r| r.id.into_inner())),
            occurred_at: Set(input.occurred_at.into()),
            created_at: Set(input.recorded_at.into()),
        };
        let result = transaction.insert(&txn).await?;

        txn.commit().await?;
        Ok(result)
    }

    /// Gets a specific transaction by ID.
    pub async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<TransactionModel, TransactionError> {
        TransactionEntity::find_by_id(transaction_id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(transaction_id))
    }

    /// Lists transactions, newest first, with the total count.
    pub async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<TransactionModel>, u64), TransactionError> {
        let mut query = TransactionEntity::find();
        if let Some(user) = filter.created_by {
            query = query.filter(financial_transactions::Column::CreatedBy.eq(user.into_inner()));
        }
        if let Some(status) = filter.status {
            query = query.filter(financial_transactions::Column::Status.eq(status.as_str()));
        }
        if let Some(ledger) = filter.ledger_type {
            query = query.filter(financial_transactions::Column::LedgerType.eq(ledger.as_str()));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(financial_transactions::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// The actor's transactions that count toward periodic limits and
    /// were recorded at or after `since`.
    pub async fn spending_history(
        &self,
        actor: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<PriorTransaction>, TransactionError> {
        let counted: Vec<&str> = [TransactionStatus::Approved, TransactionStatus::PendingApproval]
            .iter()
            .map(TransactionStatus::as_str)
            .collect();

        let rows = TransactionEntity::find()
            .filter(financial_transactions::Column::CreatedBy.eq(actor.into_inner()))
            .filter(financial_transactions::Column::Status.is_in(counted))
            .filter(financial_transactions::Column::CreatedAt.gte(since.fixed_offset()))
            .all(&self.db)
            .await?;

        rows.iter().map(to_prior).collect()
    }
}

/// Converts a stored row into a [`PriorTransaction`].
pub fn to_prior(model: &TransactionModel) -> Result<PriorTransaction, TransactionError> {
    let corrupt = |reason: String| TransactionError::Corrupt {
        id: model.id,
        reason,
    };

    let ledger_type = LedgerType::parse(&model.ledger_type)
        .ok_or_else(|| corrupt(format!("ledger_type {}", model.ledger_type)))?;
    let status = TransactionStatus::parse(&model.status)
        .ok_or_else(|| corrupt(format!("status {}", model.status)))?;
    let currency: Currency = model.currency.parse().map_err(corrupt)?;

    Ok(PriorTransaction {
        created_by: UserId::from_uuid(model.created_by),
        ledger_type,
        amount: Money::new(model.amount, currency),
        status,
        recorded_at: model.created_at.with_timezone(&Utc),
    })
}

/// Sum of amounts per currency, for list summaries.
pub fn total_by_currency(rows: &[TransactionModel]) -> Vec<(String, Decimal)> {
    let mut totals: std::collections::BTreeMap<&str, Decimal> = std::collections::BTreeMap::new();
    for row in rows {
        *totals.entry(row.currency.as_str()).or_default() += row.amount;
    }
    totals
        .into_iter()
        .map(|(currency, total)| (currency.to_string(), total))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(status: &str, currency: &str, amount: Decimal) -> TransactionModel {
        let now = Utc::now().into();
        TransactionModel {
            id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            actor_role: "finance_operational".to_string(),
            ledger_type: "OPERASIONAL".to_string(),
            amount,
            currency: currency.to_string(),
            payee_account_id: None,
            description: None,
            status: status.to_string(),
            approval_request_id: None,
            occurred_at: now,
            created_at: now,
        }
    }

    #[test]
    fn test_to_prior() {
        let prior = to_prior(&row("PENDING_APPROVAL", "IDR", dec!(250000))).unwrap();
        assert_eq!(prior.status, TransactionStatus::PendingApproval);
        assert_eq!(prior.amount, Money::idr(dec!(250000)));
        assert!(prior.status.counts_toward_limits());
    }

    #[test]
    fn test_to_prior_unknown_status() {
        assert!(matches!(
            to_prior(&row("DRAFT", "IDR", dec!(1))),
            Err(TransactionError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_total_by_currency() {
        let rows = vec![
            row("APPROVED", "IDR", dec!(1000000)),
            row("APPROVED", "USD", dec!(50)),
            row("REJECTED", "IDR", dec!(500000)),
        ];
        assert_eq!(
            total_by_currency(&rows),
            vec![
                ("IDR".to_string(), dec!(1500000)),
                ("USD".to_string(), dec!(50)),
            ]
        );
    }
}
