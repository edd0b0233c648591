//! Explicit caller identity.

use serde::{Deserialize, Serialize};

use rimba_shared::types::UserId;

use crate::access::error::AccessError;
use crate::access::role::Role;

/// A user profile as stored by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// User ID.
    pub user_id: UserId,
    /// Display name.
    pub full_name: String,
    /// The user's single role.
    pub role: Role,
    /// Elevated grant enabling god mode.
    pub god_mode: bool,
    /// Deactivated profiles are denied everything.
    pub is_active: bool,
}

impl Profile {
    /// Builds the access context for this profile.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::ProfileInactive` for deactivated profiles.
    pub fn access_context(&self) -> Result<AccessContext, AccessError> {
        if !self.is_active {
            return Err(AccessError::ProfileInactive(self.user_id));
        }
        Ok(AccessContext {
            user_id: self.user_id,
            role: self.role,
            god_mode: self.god_mode,
        })
    }
}

/// The identity every authorization decision is a function of.
///
/// Passed explicitly through every policy call instead of being looked up
/// from an ambient session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessContext {
    /// Acting user.
    pub user_id: UserId,
    /// Acting user's role.
    pub role: Role,
    /// Whether the user holds the god-mode grant.
    pub god_mode: bool,
}

impl AccessContext {
    /// Creates a context without the god-mode grant.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            god_mode: false,
        }
    }

    /// Returns a copy carrying the god-mode grant.
    #[must_use]
    pub const fn with_god_mode(mut self) -> Self {
        self.god_mode = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(is_active: bool) -> Profile {
        Profile {
            user_id: UserId::new(),
            full_name: "Sari".to_string(),
            role: Role::FinanceManager,
            god_mode: false,
            is_active,
        }
    }

    #[test]
    fn test_active_profile_yields_context() {
        let p = profile(true);
        let ctx = p.access_context().unwrap();
        assert_eq!(ctx.user_id, p.user_id);
        assert_eq!(ctx.role, Role::FinanceManager);
        assert!(!ctx.god_mode);
    }

    #[test]
    fn test_inactive_profile_is_refused() {
        let p = profile(false);
        assert!(matches!(
            p.access_context(),
            Err(AccessError::ProfileInactive(id)) if id == p.user_id
        ));
    }

    #[test]
    fn test_with_god_mode() {
        let ctx = AccessContext::new(UserId::new(), Role::Viewer).with_god_mode();
        assert!(ctx.god_mode);
        assert_eq!(ctx.role, Role::Viewer);
    }
}
