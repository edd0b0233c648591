//! Role → permission table and the pure authorization predicates.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

use crate::access::context::AccessContext;
use crate::access::error::AccessError;
use crate::access::permission::Permission;
use crate::access::role::Role;

use crate::access::permission::Permission::{
    ApprovalWorkflowManage, AuditLogView, CarbonProjectManage, CarbonProjectView,
    FinancialBankAccountManage, FinancialBankAccountVerify, FinancialBudgetManage,
    FinancialReportExport, FinancialTransactionApprove, FinancialTransactionCreate, FinancialView,
    MonevManage, MonevView, ProgramManage, ProgramView, PsManage, PsView,
};

/// Key under which the god-mode flag is reported in the enhanced map.
pub const GOD_MODE_KEY: &str = "GOD_MODE";

const FINANCE_MANAGER: &[Permission] = &[
    FinancialView,
    FinancialTransactionCreate,
    FinancialTransactionApprove,
    FinancialBudgetManage,
    FinancialReportExport,
    FinancialBankAccountManage,
    FinancialBankAccountVerify,
    ApprovalWorkflowManage,
];

const FINANCE_OPERATIONAL: &[Permission] = &[
    FinancialView,
    FinancialTransactionCreate,
    FinancialBankAccountManage,
];

const FINANCE_PROJECT: &[Permission] = &[FinancialView, FinancialTransactionCreate, ProgramView];

const FINANCE_AUDITOR: &[Permission] = &[FinancialView, FinancialReportExport, AuditLogView];

const PROGRAM_PLANNER: &[Permission] = &[
    FinancialView,
    FinancialBudgetManage,
    PsView,
    PsManage,
    CarbonProjectView,
    ProgramView,
    ProgramManage,
    MonevView,
];

const PROGRAM_IMPLEMENTER: &[Permission] =
    &[PsView, PsManage, CarbonProjectView, ProgramView, MonevView];

const CARBON_SPECIALIST: &[Permission] =
    &[PsView, CarbonProjectView, CarbonProjectManage, ProgramView];

const MONEV: &[Permission] = &[
    FinancialView,
    FinancialReportExport,
    PsView,
    CarbonProjectView,
    ProgramView,
    MonevView,
    MonevManage,
];

const INVESTOR: &[Permission] = &[
    FinancialView,
    FinancialReportExport,
    PsView,
    CarbonProjectView,
    MonevView,
];

const VIEWER: &[Permission] = &[FinancialView, PsView, CarbonProjectView, ProgramView];

/// Stateless role → permission table.
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// Permissions granted to a role by the table, ignoring god mode.
    #[must_use]
    pub const fn grants(role: Role) -> &'static [Permission] {
        match role {
            Role::Admin => &Permission::ALL,
            Role::FinanceManager => FINANCE_MANAGER,
            Role::FinanceOperational => FINANCE_OPERATIONAL,
            Role::FinanceProject => FINANCE_PROJECT,
            Role::FinanceAuditor => FINANCE_AUDITOR,
            Role::ProgramPlanner => PROGRAM_PLANNER,
            Role::ProgramImplementer => PROGRAM_IMPLEMENTER,
            Role::CarbonSpecialist => CARBON_SPECIALIST,
            Role::Monev => MONEV,
            Role::Investor => INVESTOR,
            Role::Viewer => VIEWER,
        }
    }

    /// Whether the caller holds the god-mode grant.
    #[must_use]
    pub const fn has_god_mode(ctx: &AccessContext) -> bool {
        ctx.god_mode
    }

    /// Whether the caller is a god-mode administrator.
    ///
    /// Strictly stronger than [`Self::has_god_mode`].
    #[must_use]
    pub fn is_god_admin(ctx: &AccessContext) -> bool {
        ctx.god_mode && ctx.role == Role::Admin
    }

    /// Whether the caller may perform `permission`.
    ///
    /// God mode grants every permission.
    #[must_use]
    pub fn has_permission(ctx: &AccessContext, permission: Permission) -> bool {
        Self::has_god_mode(ctx) || Self::grants(ctx.role).contains(&permission)
    }

    /// Requires a single permission.
    pub fn require(ctx: &AccessContext, permission: Permission) -> Result<(), AccessError> {
        if Self::has_permission(ctx, permission) {
            Ok(())
        } else {
            Err(AccessError::Denied(permission))
        }
    }

    /// Requires at least one of the given permissions.
    pub fn require_any(ctx: &AccessContext, permissions: &[Permission]) -> Result<(), AccessError> {
        if permissions.iter().any(|p| Self::has_permission(ctx, *p)) {
            Ok(())
        } else {
            Err(AccessError::DeniedAny(permissions.to_vec()))
        }
    }

    /// Requires the god-mode grant.
    pub fn require_god_mode(ctx: &AccessContext) -> Result<(), AccessError> {
        if Self::has_god_mode(ctx) {
            Ok(())
        } else {
            Err(AccessError::GodModeRequired)
        }
    }

    /// Requires a god-mode administrator.
    pub fn require_god_admin(ctx: &AccessContext) -> Result<(), AccessError> {
        if Self::is_god_admin(ctx) {
            Ok(())
        } else {
            Err(AccessError::GodAdminRequired)
        }
    }

    /// The full permission map for display purposes.
    #[must_use]
    pub fn enhanced(ctx: &AccessContext) -> EnhancedPermissions {
        EnhancedPermissions {
            permissions: Permission::ALL
                .into_iter()
                .map(|p| (p, Self::has_permission(ctx, p)))
                .collect(),
            god_mode: Self::has_god_mode(ctx),
        }
    }
}

/// Every permission key mapped to a boolean, plus the god-mode flag.
///
/// Serializes as a flat object: `{"FINANCIAL_VIEW": true, ..., "GOD_MODE": false}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedPermissions {
    /// Per-permission decision.
    pub permissions: BTreeMap<Permission, bool>,
    /// God-mode flag.
    pub god_mode: bool,
}

impl EnhancedPermissions {
    /// A map that denies everything; used when the caller cannot be resolved.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            permissions: Permission::ALL.into_iter().map(|p| (p, false)).collect(),
            god_mode: false,
        }
    }

    /// Looks up a single permission.
    #[must_use]
    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions.get(&permission).copied().unwrap_or(false)
    }
}

impl Serialize for EnhancedPermissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.permissions.len() + 1))?;
        for (permission, allowed) in &self.permissions {
            map.serialize_entry(permission.as_str(), allowed)?;
        }
        map.serialize_entry(GOD_MODE_KEY, &self.god_mode)?;
        map.end()
    }
}
