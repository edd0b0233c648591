//! User roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::access::error::AccessError;

/// Role carried by a user profile.
///
/// Exactly one role per user. Roles are assigned by the identity provider
/// and are never written by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Monitoring & evaluation staff.
    Monev,
    /// Read-only dashboard user.
    Viewer,
    /// Plans programs and budgets.
    ProgramPlanner,
    /// Runs programs in the field.
    ProgramImplementer,
    /// Carbon project specialist.
    CarbonSpecialist,
    /// Head of finance; approves transactions and manages budgets.
    FinanceManager,
    /// Operational ledger bookkeeper.
    FinanceOperational,
    /// Project ledger bookkeeper.
    FinanceProject,
    /// Internal auditor.
    FinanceAuditor,
    /// External investor with reporting access.
    Investor,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Admin,
        Self::Monev,
        Self::Viewer,
        Self::ProgramPlanner,
        Self::ProgramImplementer,
        Self::CarbonSpecialist,
        Self::FinanceManager,
        Self::FinanceOperational,
        Self::FinanceProject,
        Self::FinanceAuditor,
        Self::Investor,
    ];

    /// Returns the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Monev => "monev",
            Self::Viewer => "viewer",
            Self::ProgramPlanner => "program_planner",
            Self::ProgramImplementer => "program_implementer",
            Self::CarbonSpecialist => "carbon_specialist",
            Self::FinanceManager => "finance_manager",
            Self::FinanceOperational => "finance_operational",
            Self::FinanceProject => "finance_project",
            Self::FinanceAuditor => "finance_auditor",
            Self::Investor => "investor",
        }
    }

    /// Parses a role from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|r| r.as_str() == needle)
    }

    /// Returns true for the finance family of roles.
    #[must_use]
    pub const fn is_finance(&self) -> bool {
        matches!(
            self,
            Self::FinanceManager
                | Self::FinanceOperational
                | Self::FinanceProject
                | Self::FinanceAuditor
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| AccessError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_role() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(
            Role::parse(" Finance_Operational "),
            Some(Role::FinanceOperational)
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Role::parse("superadmin"), None);
        assert!(matches!(
            "root".parse::<Role>(),
            Err(AccessError::UnknownRole(r)) if r == "root"
        ));
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::CarbonSpecialist).unwrap();
        assert_eq!(json, "\"carbon_specialist\"");
    }

    #[test]
    fn test_finance_family() {
        assert!(Role::FinanceAuditor.is_finance());
        assert!(!Role::Admin.is_finance());
        assert!(!Role::Investor.is_finance());
    }
}
