//! Closed set of permission keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::access::error::AccessError;

/// A capability that can be granted to a role.
///
/// The set is closed: an unknown key is a parse error rather than a silent
/// denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// View financial dashboards, limits, workflows and transactions.
    FinancialView,
    /// Propose financial transactions.
    FinancialTransactionCreate,
    /// Approve financial transactions.
    FinancialTransactionApprove,
    /// Manage budgets and spending limits.
    FinancialBudgetManage,
    /// Export financial reports.
    FinancialReportExport,
    /// Add and edit whitelisted payee accounts.
    FinancialBankAccountManage,
    /// Change the verification status of payee accounts.
    FinancialBankAccountVerify,
    /// Create and edit approval workflows.
    ApprovalWorkflowManage,
    /// View social forestry permits.
    PsView,
    /// Manage social forestry permits.
    PsManage,
    /// View carbon projects.
    CarbonProjectView,
    /// Manage carbon projects.
    CarbonProjectManage,
    /// View programs.
    ProgramView,
    /// Manage programs.
    ProgramManage,
    /// View monitoring & evaluation data.
    MonevView,
    /// Manage monitoring & evaluation data.
    MonevManage,
    /// Read the audit log.
    AuditLogView,
    /// Manage user accounts.
    UserManage,
}

impl Permission {
    /// Every permission key, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::FinancialView,
        Self::FinancialTransactionCreate,
        Self::FinancialTransactionApprove,
        Self::FinancialBudgetManage,
        Self::FinancialReportExport,
        Self::FinancialBankAccountManage,
        Self::FinancialBankAccountVerify,
        Self::ApprovalWorkflowManage,
        Self::PsView,
        Self::PsManage,
        Self::CarbonProjectView,
        Self::CarbonProjectManage,
        Self::ProgramView,
        Self::ProgramManage,
        Self::MonevView,
        Self::MonevManage,
        Self::AuditLogView,
        Self::UserManage,
    ];

    /// Returns the wire key of the permission.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FinancialView => "FINANCIAL_VIEW",
            Self::FinancialTransactionCreate => "FINANCIAL_TRANSACTION_CREATE",
            Self::FinancialTransactionApprove => "FINANCIAL_TRANSACTION_APPROVE",
            Self::FinancialBudgetManage => "FINANCIAL_BUDGET_MANAGE",
            Self::FinancialReportExport => "FINANCIAL_REPORT_EXPORT",
            Self::FinancialBankAccountManage => "FINANCIAL_BANK_ACCOUNT_MANAGE",
            Self::FinancialBankAccountVerify => "FINANCIAL_BANK_ACCOUNT_VERIFY",
            Self::ApprovalWorkflowManage => "APPROVAL_WORKFLOW_MANAGE",
            Self::PsView => "PS_VIEW",
            Self::PsManage => "PS_MANAGE",
            Self::CarbonProjectView => "CARBON_PROJECT_VIEW",
            Self::CarbonProjectManage => "CARBON_PROJECT_MANAGE",
            Self::ProgramView => "PROGRAM_VIEW",
            Self::ProgramManage => "PROGRAM_MANAGE",
            Self::MonevView => "MONEV_VIEW",
            Self::MonevManage => "MONEV_MANAGE",
            Self::AuditLogView => "AUDIT_LOG_VIEW",
            Self::UserManage => "USER_MANAGE",
        }
    }

    /// Parses a permission key (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_uppercase();
        Self::ALL.into_iter().find(|p| p.as_str() == needle)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AccessError::UnknownPermission(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<_> = Permission::ALL.iter().map(Permission::as_str).collect();
        assert_eq!(keys.len(), Permission::ALL.len());
    }

    #[test]
    fn test_parse_round_trips() {
        for p in Permission::ALL {
            assert_eq!(Permission::parse(p.as_str()), Some(p));
        }
        assert_eq!(
            Permission::parse("financial_budget_manage"),
            Some(Permission::FinancialBudgetManage)
        );
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        assert!(matches!(
            "GOD_MODE".parse::<Permission>(),
            Err(AccessError::UnknownPermission(_))
        ));
    }

    #[test]
    fn test_serde_matches_wire_key() {
        for p in Permission::ALL {
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.as_str()));
        }
    }
}
