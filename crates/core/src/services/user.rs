//! User service: accounts, sessions and avatars.

use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use hasker_common::{AppError, AppResult, IdGenerator, StorageBackend, generate_storage_key};
use hasker_db::{
    entities::{user, user_profile},
    repositories::{UserProfileRepository, UserRepository},
};
use image::ImageFormat;
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

pub use hasker_common::DEFAULT_AVATAR_URL;

/// Largest accepted avatar upload.
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

#[allow(clippy::unwrap_used)]
static USERNAME_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@.+_-]{1,150}$").unwrap());

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username")
            .with_message("Letters, digits and @/./+/-/_ only, at most 150 characters".into()))
    }
}

/// Input for signing up.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[validate(email)]
    pub email: Option<String>,

    #[validate(
        length(min = 8, max = 128),
        must_match(other = "password2", message = "Passwords don't match")
    )]
    pub password1: String,

    pub password2: String,
}

/// Input for logging in.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// Input for the settings page. Username is not editable.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SettingsInput {
    /// `None` leaves the address alone; an empty string removes it.
    #[validate(email)]
    pub email: Option<String>,

    /// Remove the current avatar.
    #[serde(default)]
    pub clear_avatar: bool,
}

/// An uploaded avatar file.
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub avatar_url: String,
}

/// A signed-in account and its bearer token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: Account,
}

/// The avatar to display for a profile.
#[must_use]
pub fn avatar_url(profile: Option<&user_profile::Model>) -> String {
    profile
        .and_then(|p| p.avatar_url.clone())
        .unwrap_or_else(|| DEFAULT_AVATAR_URL.to_string())
}

/// Check that an upload is an image we accept, and return its format.
pub fn validate_avatar(upload: &AvatarUpload) -> AppResult<ImageFormat> {
    if upload.data.len() > MAX_AVATAR_BYTES {
        return Err(AppError::Validation(format!(
            "Avatar must be at most {MAX_AVATAR_BYTES} bytes"
        )));
    }

    let format = image::guess_format(&upload.data)
        .map_err(|_| AppError::Validation("Avatar must be an image".to_string()))?;

    match format {
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::WebP => Ok(format),
        other => Err(AppError::Validation(format!(
            "Unsupported avatar format: {other:?}"
        ))),
    }
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Sign up: store the avatar, then create the user and its profile
    /// together, and return a session.
    ///
    /// A stored avatar is removed again if the rows cannot be written.
    pub async fn register(
        &self,
        mut input: RegisterInput,
        avatar: Option<AvatarUpload>,
    ) -> AppResult<Session> {
        input.email = input.email.filter(|e| !e.trim().is_empty());
        input.validate()?;
        let avatar_format = avatar.as_ref().map(validate_avatar).transpose()?;

        if self.user_repo.username_exists(&input.username).await? {
            return Err(AppError::Conflict(format!(
                "Username {} is already taken",
                input.username
            )));
        }

        let password_hash = hash_password(&input.password1)?;
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let (avatar_key, avatar_url) = match (avatar, avatar_format) {
            (Some(upload), Some(format)) => {
                let (key, url) = self.store_avatar(&user_id, &upload, format).await?;
                (Some(key), Some(url))
            }
            _ => (None, None),
        };

        let user_model = user::ActiveModel {
            id: Set(user_id.clone()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email),
            token: Set(Some(token.clone())),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };
        let profile_model = user_profile::ActiveModel {
            user_id: Set(user_id),
            password: Set(password_hash),
            avatar_key: Set(avatar_key.clone()),
            avatar_url: Set(avatar_url),
            updated_at: Set(None),
        };

        let (user, profile) = match self
            .user_repo
            .create_with_profile(user_model, profile_model)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                if let Some(key) = avatar_key
                    && let Err(delete_err) = self.storage.delete(&key).await
                {
                    warn!(error = %delete_err, key = %key, "Failed to remove orphaned avatar");
                }
                return Err(e);
            }
        };

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(Session {
            token,
            user: account(&user, Some(&profile)),
        })
    }

    /// Check credentials and return a session.
    pub async fn login(&self, input: LoginInput) -> AppResult<Session> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .ok_or(AppError::Unauthorized)?;
        let profile = self
            .profile_repo
            .find_by_user_id(&user.id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &profile.password)? {
            return Err(AppError::Unauthorized);
        }

        let token = match user.token.clone() {
            Some(token) => token,
            None => self.rotate_token(&user.id).await?,
        };

        Ok(Session {
            token,
            user: account(&user, Some(&profile)),
        })
    }

    /// Invalidate the current token by replacing it.
    pub async fn logout(&self, user_id: &str) -> AppResult<()> {
        self.rotate_token(user_id).await?;
        info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Current settings.
    pub async fn settings(&self, user: &user::Model) -> AppResult<Account> {
        let profile = self.profile_repo.find_by_user_id(&user.id).await?;
        Ok(account(user, profile.as_ref()))
    }

    /// Change e-mail and avatar.
    ///
    /// A new avatar wins over `clear_avatar`. The replaced file is removed
    /// from storage after the profile points at the new one.
    pub async fn update_settings(
        &self,
        user: &user::Model,
        mut input: SettingsInput,
        avatar: Option<AvatarUpload>,
    ) -> AppResult<Account> {
        let clear_email = input.email.as_deref().is_some_and(|e| e.trim().is_empty());
        if clear_email {
            input.email = None;
        }
        input.validate()?;
        let avatar_format = avatar.as_ref().map(validate_avatar).transpose()?;

        let user = if clear_email || input.email.is_some() {
            let mut active: user::ActiveModel = user.clone().into();
            active.email = Set(input.email);
            active.updated_at = Set(Some(chrono::Utc::now().into()));
            self.user_repo.update(active).await?
        } else {
            user.clone()
        };

        let mut profile = self.profile_repo.get_by_user_id(&user.id).await?;
        let old_key = profile.avatar_key.clone();

        let replaced = match (avatar, avatar_format) {
            (Some(upload), Some(format)) => {
                let stored = self.store_avatar(&user.id, &upload, format).await?;
                profile = self
                    .profile_repo
                    .update_avatar(&user.id, Some(stored))
                    .await?;
                true
            }
            _ if input.clear_avatar => {
                profile = self.profile_repo.update_avatar(&user.id, None).await?;
                true
            }
            _ => false,
        };

        if replaced
            && let Some(key) = old_key
            && let Err(e) = self.storage.delete(&key).await
        {
            warn!(error = %e, key = %key, "Failed to delete old avatar");
        }

        Ok(account(&user, Some(&profile)))
    }

    async fn rotate_token(&self, user_id: &str) -> AppResult<String> {
        let token = self.id_gen.generate_token();
        self.user_repo.update_token(user_id, &token).await?;
        Ok(token)
    }

    async fn store_avatar(
        &self,
        user_id: &str,
        upload: &AvatarUpload,
        format: ImageFormat,
    ) -> AppResult<(String, String)> {
        let extension = format.extensions_str().first().copied().unwrap_or("bin");
        let key = generate_storage_key(user_id, &format!("avatar.{extension}"));
        let stored = self
            .storage
            .upload(&key, &upload.data, format.to_mime_type())
            .await?;
        Ok((stored.key, stored.url))
    }
}

fn account(user: &user::Model, profile: Option<&user_profile::Model>) -> Account {
    Account {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        avatar_url: avatar_url(profile),
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
