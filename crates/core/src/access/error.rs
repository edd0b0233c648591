//! Access control error types.

use rimba_shared::types::UserId;
use thiserror::Error;

use crate::access::permission::Permission;

/// Errors raised while resolving identities or checking permissions.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// The role string is not a known role.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// The permission key is not a known permission.
    #[error("Unknown permission key: {0}")]
    UnknownPermission(String),

    /// No profile exists for the user.
    #[error("No profile for user {0}")]
    ProfileNotFound(UserId),

    /// The profile exists but is deactivated.
    #[error("Profile for user {0} is inactive")]
    ProfileInactive(UserId),

    /// The profile directory could not be queried.
    #[error("Profile directory unavailable: {0}")]
    Directory(String),

    /// The caller lacks a permission.
    #[error("Missing permission {0}")]
    Denied(Permission),

    /// The caller lacks every one of the accepted permissions.
    #[error("Requires one of: {}", .0.iter().map(Permission::as_str).collect::<Vec<_>>().join(", "))]
    DeniedAny(Vec<Permission>),

    /// The operation is reserved for god-mode users.
    #[error("God mode required")]
    GodModeRequired,

    /// The operation is reserved for god-mode administrators.
    #[error("God-mode administrator required")]
    GodAdminRequired,
}

impl AccessError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::UnknownRole(_) | Self::UnknownPermission(_) => 400,
            Self::ProfileNotFound(_)
            | Self::ProfileInactive(_)
            | Self::Denied(_)
            | Self::DeniedAny(_)
            | Self::GodModeRequired
            | Self::GodAdminRequired => 403,
            Self::Directory(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownRole(_) => "UNKNOWN_ROLE",
            Self::UnknownPermission(_) => "UNKNOWN_PERMISSION",
            Self::ProfileNotFound(_) => "PROFILE_NOT_FOUND",
            Self::ProfileInactive(_) => "PROFILE_INACTIVE",
            Self::Directory(_) => "DIRECTORY_UNAVAILABLE",
            Self::Denied(_) | Self::DeniedAny(_) => "PERMISSION_DENIED",
            Self::GodModeRequired => "GOD_MODE_REQUIRED",
            Self::GodAdminRequired => "GOD_ADMIN_REQUIRED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_error() {
        let err = AccessError::Denied(Permission::FinancialBudgetManage);
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        assert!(err.to_string().contains("FINANCIAL_BUDGET_MANAGE"));
    }

    #[test]
    fn test_denied_any_lists_alternatives() {
        let err = AccessError::DeniedAny(vec![
            Permission::FinancialBudgetManage,
            Permission::FinancialTransactionApprove,
        ]);
        assert_eq!(
            err.to_string(),
            "Requires one of: FINANCIAL_BUDGET_MANAGE, FINANCIAL_TRANSACTION_APPROVE"
        );
    }

    #[test]
    fn test_directory_error_is_internal() {
        let err = AccessError::Directory("connection refused".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "DIRECTORY_UNAVAILABLE");
    }

    #[test]
    fn test_unknown_inputs_are_bad_requests() {
        assert_eq!(AccessError::UnknownRole("x".into()).status_code(), 400);
        assert_eq!(AccessError::UnknownPermission("x".into()).status_code(), 400);
    }
}
