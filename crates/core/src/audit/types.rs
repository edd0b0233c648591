//! Audit trail types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use rimba_shared::types::{AuditEntryId, UserId};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Row created.
    Create,
    /// Row edited.
    Update,
    /// Row deleted.
    Delete,
    /// `is_active` flipped.
    Toggle,
    /// Bank account verification decision.
    Verify,
    /// Approval recorded.
    Approve,
    /// Rejection recorded.
    Reject,
    /// Request approved by the inaction timer.
    AutoApprove,
    /// Console statement executed.
    Query,
    /// Audit log cleared.
    Clear,
}

impl AuditAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Toggle => "TOGGLE",
            Self::Verify => "VERIFY",
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::AutoApprove => "AUTO_APPROVE",
            Self::Query => "QUERY",
            Self::Clear => "CLEAR",
        }
    }

    /// Parses an action (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CREATE" => Some(Self::Create),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            "TOGGLE" => Some(Self::Toggle),
            "VERIFY" => Some(Self::Verify),
            "APPROVE" => Some(Self::Approve),
            "REJECT" => Some(Self::Reject),
            "AUTO_APPROVE" => Some(Self::AutoApprove),
            "QUERY" => Some(Self::Query),
            "CLEAR" => Some(Self::Clear),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entity an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Spending limit row.
    SpendingLimit,
    /// Approval workflow row.
    ApprovalWorkflow,
    /// Whitelisted bank account.
    BankAccount,
    /// Financial transaction.
    FinancialTransaction,
    /// Approval request.
    ApprovalRequest,
    /// The audit log itself.
    AuditLog,
    /// The SQL console.
    Console,
}

impl EntityType {
    /// Returns the string representation of the entity type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SpendingLimit => "spending_limit",
            Self::ApprovalWorkflow => "approval_workflow",
            Self::BankAccount => "bank_account",
            Self::FinancialTransaction => "financial_transaction",
            Self::ApprovalRequest => "approval_request",
            Self::AuditLog => "audit_log",
            Self::Console => "console",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit trail record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry ID.
    pub id: AuditEntryId,
    /// Acting user; `None` for system actions such as the auto-approval sweep.
    pub actor_id: Option<UserId>,
    /// What happened.
    pub action: AuditAction,
    /// Kind of entity touched.
    pub entity_type: EntityType,
    /// Entity touched, if a single one.
    pub entity_id: Option<Uuid>,
    /// Free-form details.
    pub details: serde_json::Value,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Records an action by a user.
    #[must_use]
    pub fn by_user(
        actor: UserId,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            actor_id: Some(actor),
            action,
            entity_type,
            entity_id,
            details,
            created_at: Utc::now(),
        }
    }

    /// Records an action taken by the system.
    #[must_use]
    pub fn by_system(
        action: AuditAction,
        entity_type: EntityType,
        entity_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: AuditEntryId::new(),
            actor_id: None,
            action,
            entity_type,
            entity_id,
            details,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_round_trip() {
        for action in [
            AuditAction::Create,
            AuditAction::AutoApprove,
            AuditAction::Clear,
        ] {
            assert_eq!(AuditAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(AuditAction::parse("nope"), None);
    }

    #[test]
    fn test_system_entry_has_no_actor() {
        let entry = AuditEntry::by_system(
            AuditAction::AutoApprove,
            EntityType::ApprovalRequest,
            Some(Uuid::nil()),
            json!({ "due_at": "2026-03-13T08:00:00Z" }),
        );
        assert_eq!(entry.actor_id, None);
        assert_eq!(entry.entity_type.as_str(), "approval_request");
    }

    #[test]
    fn test_user_entry_serializes() {
        let actor = UserId::new();
        let entry = AuditEntry::by_user(
            actor,
            AuditAction::Toggle,
            EntityType::SpendingLimit,
            None,
            json!({ "is_active": false }),
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["action"], "TOGGLE");
        assert_eq!(value["entity_type"], "spending_limit");
        assert_eq!(value["actor_id"], actor.to_string());
    }
}
