//! Profile Repository
//!
//! Read access to user profiles, exposed to the permission oracle as a
//! [`ProfileDirectory`]. Profiles are owned by the identity provider; the
//! only write here is the upsert used for seeding.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, Set, sea_query::OnConflict};
use tracing::error;

use rimba_core::access::{AccessError, Profile, ProfileDirectory, Role};
use rimba_shared::types::UserId;

use crate::entities::profiles::{self, Entity as ProfileEntity, Model as ProfileModel};

/// Repository for profile operations.
#[derive(Clone)]
pub struct ProfileRepository {
    db: DatabaseConnection,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a profile row by user id.
    pub async fn find_by_id(&self, user_id: UserId) -> Result<Option<ProfileModel>, sea_orm::DbErr> {
        ProfileEntity::find_by_id(user_id.into_inner())
            .one(&self.db)
            .await
    }

    /// Inserts or replaces a profile.
    pub async fn upsert(&self, profile: &Profile) -> Result<(), sea_orm::DbErr> {
        let now = Utc::now();
        let model = profiles::ActiveModel {
            id: Set(profile.user_id.into_inner()),
            full_name: Set(profile.full_name.clone()),
            role: Set(profile.role.as_str().to_string()),
            god_mode: Set(profile.god_mode),
            is_active: Set(profile.is_active),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        ProfileEntity::insert(model)
            .on_conflict(
                OnConflict::column(profiles::Column::Id)
                    .update_columns([
                        profiles::Column::FullName,
                        profiles::Column::Role,
                        profiles::Column::GodMode,
                        profiles::Column::IsActive,
                        profiles::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for ProfileRepository {
    async fn find_profile(&self, user_id: UserId) -> Result<Option<Profile>, AccessError> {
        let row = self.find_by_id(user_id).await.map_err(|e| {
            error!(user_id = %user_id, error = %e, "Failed to load profile");
            AccessError::Directory(e.to_string())
        })?;

        row.map(|m| to_domain(&m)).transpose()
    }
}

/// Converts a stored row into a [`Profile`].
pub fn to_domain(model: &ProfileModel) -> Result<Profile, AccessError> {
    let role =
        Role::parse(&model.role).ok_or_else(|| AccessError::UnknownRole(model.role.clone()))?;

    Ok(Profile {
        user_id: UserId::from_uuid(model.id),
        full_name: model.full_name.clone(),
        role,
        god_mode: model.god_mode,
        is_active: model.is_active,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn model(role: &str) -> ProfileModel {
        let now = Utc::now().into();
        ProfileModel {
            id: Uuid::new_v4(),
            full_name: "Sari Wulandari".to_string(),
            role: role.to_string(),
            god_mode: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_to_domain() {
        let profile = to_domain(&model("admin")).unwrap();
        assert_eq!(profile.role, Role::Admin);
        assert!(profile.god_mode);
        assert_eq!(profile.access_context().unwrap().role, Role::Admin);
    }

    #[test]
    fn test_to_domain_unknown_role() {
        assert!(matches!(
            to_domain(&model("superuser")),
            Err(AccessError::UnknownRole(r)) if r == "superuser"
        ));
    }
}
