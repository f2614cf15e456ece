//! Account endpoints: signup, login, logout and settings.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use hasker_common::{AppError, AppResult};
use hasker_core::{Account, AvatarUpload, LoginInput, RegisterInput, Session, SettingsInput};

use crate::{extractors::AuthUser, middleware::AppState, response};

/// Largest account form accepted: a full-size avatar plus the text fields.
pub const MAX_FORM_BYTES: usize = 4 * 1024 * 1024;

/// Text fields and the optional `avatar` file of a multipart form.
#[derive(Debug, Default)]
struct AccountForm {
    fields: HashMap<String, String>,
    avatar: Option<AvatarUpload>,
}

impl AccountForm {
    async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "avatar" {
                let file_name = field.file_name().unwrap_or("avatar").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                // Browsers send an empty part when no file was chosen
                if !data.is_empty() {
                    form.avatar = Some(AvatarUpload {
                        file_name,
                        data: data.to_vec(),
                    });
                }
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    fn flag(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .is_some_and(|v| matches!(v.as_str(), "on" | "true" | "1"))
    }
}

/// Sign up with a multipart form.
async fn signup(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<Session>)> {
    let mut form = AccountForm::read(multipart).await?;
    let input = RegisterInput {
        username: form.take("username").unwrap_or_default(),
        email: form.take("email"),
        password1: form.take("password1").unwrap_or_default(),
        password2: form.take("password2").unwrap_or_default(),
    };

    let session = state.user_service.register(input, form.avatar).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Exchange credentials for a token.
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<Session>> {
    Ok(Json(state.user_service.login(input).await?))
}

/// Rotate the caller's token.
async fn logout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.user_service.logout(&user.id).await?;
    Ok(response::no_content())
}

/// Current settings.
async fn settings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Account>> {
    Ok(Json(state.user_service.settings(&user).await?))
}

/// Change e-mail and avatar with a multipart form.
async fn update_settings(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<Account>> {
    let mut form = AccountForm::read(multipart).await?;
    let input = SettingsInput {
        clear_avatar: form.flag("avatar-clear"),
        email: form.take("email"),
    };

    let account = state
        .user_service
        .update_settings(&user, input, form.avatar)
        .await?;
    Ok(Json(account))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/signup/", post(signup))
        .route("/users/login/", post(login))
        .route("/users/logout/", post(logout))
        .route("/users/settings/", get(settings).post(update_settings))
        .layer(DefaultBodyLimit::max(MAX_FORM_BYTES))
}
