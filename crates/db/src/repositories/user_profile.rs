//! User profile repository.

use std::sync::Arc;

use crate::entities::{UserProfile, user_profile};
use hasker_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// User profile repository for database operations.
#[derive(Clone)]
pub struct UserProfileRepository {
    db: Arc<DatabaseConnection>,
}

impl UserProfileRepository {
    /// Create a new user profile repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user profile by user ID.
    pub async fn find_by_user_id(&self, user_id: &str) -> AppResult<Option<user_profile::Model>> {
        UserProfile::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user profile by user ID, returning an error if not found.
    pub async fn get_by_user_id(&self, user_id: &str) -> AppResult<user_profile::Model> {
        self.find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("UserProfile: {user_id}")))
    }

    /// Set or clear the avatar.
    pub async fn update_avatar(
        &self,
        user_id: &str,
        avatar: Option<(String, String)>,
    ) -> AppResult<user_profile::Model> {
        let profile = self.get_by_user_id(user_id).await?;
        let (key, url) = avatar.unzip();
        let mut active: user_profile::ActiveModel = profile.into();
        active.avatar_key = Set(key);
        active.avatar_url = Set(url);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
