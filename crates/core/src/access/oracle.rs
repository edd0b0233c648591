//! Permission oracle: resolves a caller and answers permission questions.
//!
//! Resolution goes through a [`ProfileDirectory`] (implemented by the
//! database layer). Every failure to resolve the caller fails closed.

use async_trait::async_trait;
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use rimba_shared::types::UserId;

use crate::access::context::{AccessContext, Profile};
use crate::access::error::AccessError;
use crate::access::matrix::{EnhancedPermissions, PermissionMatrix};
use crate::access::permission::Permission;

/// Default cache capacity (number of resolved callers).
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Source of user profiles.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Looks up the profile of a user. `Ok(None)` means no such user.
    async fn find_profile(&self, user_id: UserId) -> Result<Option<Profile>, AccessError>;
}

/// In-memory directory, for seeding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    profiles: HashMap<UserId, Profile>,
}

impl StaticDirectory {
    /// Creates a directory holding the given profiles.
    #[must_use]
    pub fn new(profiles: impl IntoIterator<Item = Profile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.user_id, p)).collect(),
        }
    }
}

#[async_trait]
impl ProfileDirectory for StaticDirectory {
    async fn find_profile(&self, user_id: UserId) -> Result<Option<Profile>, AccessError> {
        Ok(self.profiles.get(&user_id).cloned())
    }
}

/// Answers permission questions for a user id.
#[derive(Clone)]
pub struct PermissionOracle {
    directory: Arc<dyn ProfileDirectory>,
    cache: Option<Cache<UserId, AccessContext>>,
}

impl std::fmt::Debug for PermissionOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionOracle")
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl PermissionOracle {
    /// Creates an oracle caching resolved callers for `ttl`.
    ///
    /// A zero TTL disables caching.
    #[must_use]
    pub fn new(directory: Arc<dyn ProfileDirectory>, ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(DEFAULT_CACHE_CAPACITY)
                .time_to_live(ttl)
                .build()
        });
        Self { directory, cache }
    }

    /// Resolves the access context of a user.
    ///
    /// Errors are never cached.
    pub async fn resolve(&self, user_id: UserId) -> Result<AccessContext, AccessError> {
        if let Some(cache) = &self.cache
            && let Some(ctx) = cache.get(&user_id).await
        {
            return Ok(ctx);
        }

        let profile = self
            .directory
            .find_profile(user_id)
            .await?
            .ok_or(AccessError::ProfileNotFound(user_id))?;
        let ctx = profile.access_context()?;

        if let Some(cache) = &self.cache {
            cache.insert(user_id, ctx).await;
        }
        Ok(ctx)
    }

    /// Drops any cached context for a user.
    pub async fn invalidate(&self, user_id: UserId) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&user_id).await;
        }
    }

    async fn resolve_or_deny(&self, user_id: UserId) -> Option<AccessContext> {
        match self.resolve(user_id).await {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Access check failed closed");
                None
            }
        }
    }

    /// Whether the user may perform `permission`. Fails closed.
    pub async fn has_permission(&self, user_id: UserId, permission: Permission) -> bool {
        self.resolve_or_deny(user_id)
            .await
            .is_some_and(|ctx| PermissionMatrix::has_permission(&ctx, permission))
    }

    /// Whether the user holds the god-mode grant. Fails closed.
    pub async fn has_god_mode(&self, user_id: UserId) -> bool {
        self.resolve_or_deny(user_id)
            .await
            .is_some_and(|ctx| PermissionMatrix::has_god_mode(&ctx))
    }

    /// Whether the user is a god-mode administrator. Fails closed.
    pub async fn is_god_admin(&self, user_id: UserId) -> bool {
        self.resolve_or_deny(user_id)
            .await
            .is_some_and(|ctx| PermissionMatrix::is_god_admin(&ctx))
    }

    /// The full permission map of a user; all `false` when unresolvable.
    pub async fn enhanced_permissions(&self, user_id: UserId) -> EnhancedPermissions {
        self.resolve_or_deny(user_id)
            .await
            .map_or_else(EnhancedPermissions::deny_all, |ctx| {
                PermissionMatrix::enhanced(&ctx)
            })
    }
}
