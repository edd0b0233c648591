//! Audit Log Repository
//!
//! Append-only storage of audit entries, plus the god-mode bulk clear.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use rimba_core::audit::{AuditAction, AuditEntry, EntityType};
use rimba_shared::types::UserId;

use crate::entities::audit_logs::{self, ActiveModel, Entity as AuditLogEntity, Model as AuditLogModel};

/// Filter for listing audit entries.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    /// Only entries by this actor.
    pub actor_id: Option<UserId>,
    /// Only entries about this entity type.
    pub entity_type: Option<EntityType>,
    /// Only entries about this entity.
    pub entity_id: Option<Uuid>,
}

/// Repository for audit log operations.
#[derive(Clone)]
pub struct AuditLogRepository {
    db: DatabaseConnection,
}

impl AuditLogRepository {
    /// Creates a new AuditLogRepository.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an entry.
    pub async fn record(&self, entry: &AuditEntry) -> Result<AuditLogModel, sea_orm::DbErr> {
        active_model(entry).insert(&self.db).await
    }

    /// Lists entries, newest first, with the total count.
    pub async fn list_entries(
        &self,
        filter: &AuditLogFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<AuditLogModel>, u64), sea_orm::DbErr> {
        let mut query = AuditLogEntity::find();
        if let Some(actor) = filter.actor_id {
            query = query.filter(audit_logs::Column::ActorId.eq(actor.into_inner()));
        }
        if let Some(entity_type) = filter.entity_type {
            query = query.filter(audit_logs::Column::EntityType.eq(entity_type.as_str()));
        }
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(audit_logs::Column::EntityId.eq(entity_id));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(audit_logs::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Deletes every entry and records the clear itself as the first entry
    /// of the new log. Returns the number of entries removed.
    pub async fn clear_all(&self, actor: UserId) -> Result<u64, sea_orm::DbErr> {
        let txn = self.db.begin().await?;

        let removed = AuditLogEntity::delete_many().exec(&txn).await?.rows_affected;
        let marker = AuditEntry::by_user(
            actor,
            AuditAction::Clear,
            EntityType::AuditLog,
            None,
            serde_json::json!({ "removed": removed }),
        );
        active_model(&marker).insert(&txn).await?;

        txn.commit().await?;
        Ok(removed)
    }
}

fn active_model(entry: &AuditEntry) -> ActiveModel {
    ActiveModel {
        id: Set(entry.id.into_inner()),
        actor_id: Set(entry.actor_id.map(UserId::into_inner)),
        action: Set(entry.action.as_str().to_string()),
        entity_type: Set(entry.entity_type.as_str().to_string()),
        entity_id: Set(entry.entity_id),
        details: Set(entry.details.clone()),
        created_at: Set(entry.created_at.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_active_model_maps_entry() {
        let actor = UserId::new();
        let entity = Uuid::new_v4();
        let entry = AuditEntry::by_user(
            actor,
            AuditAction::Toggle,
            EntityType::SpendingLimit,
            Some(entity),
            json!({ "is_active": false }),
        );

        let model = active_model(&entry);
        assert_eq!(model.action, Set("TOGGLE".to_string()));
        assert_eq!(model.entity_type, Set("spending_limit".to_string()));
        assert_eq!(model.actor_id, Set(Some(actor.into_inner())));
        assert_eq!(model.entity_id, Set(Some(entity)));
    }
}
