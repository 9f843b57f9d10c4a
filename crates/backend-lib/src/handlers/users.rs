// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! Registration, login and current-user endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use linkshelf_common::{
    CurrentUserResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    RegisteredUser, UserData, UserIdentity,
};
use metrics::counter;

use super::json_body;
use crate::auth::{constant_time_eq, validate_password_strength};
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED, USER_REGISTERED};
use crate::storage::NewUser;
use crate::validation::{present, validate_email, validate_username, ValidationError};
use crate::AppState;

/// `POST /api/users/register`
///
/// Only callers holding the configured admin secret may create accounts.
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let req = json_body(payload)?;

    let (Some(username), Some(email), Some(password), Some(secret)) = (
        present(req.username.as_deref()),
        present(req.email.as_deref()),
        req.password.as_deref().filter(|p| !p.is_empty()),
        req.secret.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(ValidationError::AllFieldsMandatory.into());
    };

    let email = validate_email(email)?;
    let username = validate_username(username)?;

    let requirements = &state.settings.password_requirements;
    if !validate_password_strength(password, requirements) {
        return Err(ValidationError::WeakPassword(requirements.describe()).into());
    }

    if !constant_time_eq(secret.as_bytes(), state.settings.admin_secret.as_bytes()) {
        tracing::warn!(%email, "registration attempted with a wrong admin secret");
        return Err(AppError::NotAdmin);
    }

    let credential = state.auth.hash_password(password.to_string()).await?;
    let user = state
        .storage
        .insert_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            credential,
        })
        .await?;

    counter!(USER_REGISTERED).increment(1);
    tracing::info!(user_id = user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully!".to_string(),
            user: RegisteredUser {
                id: user.id,
                username: user.username,
                email: user.email,
                created_at: user.created_at,
            },
        }),
    ))
}

/// `POST /api/users/login`
///
/// Unknown emails and wrong passwords are indistinguishable to the caller.
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let req = json_body(payload)?;

    let (Some(email), Some(password)) = (
        present(req.email.as_deref()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ValidationError::AllFieldsMandatory.into());
    };

    let Some(user) = state.storage.find_user_by_email(email).await? else {
        state.auth.verify_unknown_user(password).await;
        counter!(LOGIN_FAILED).increment(1);
        return Err(AppError::InvalidCredentials);
    };

    if !state
        .auth
        .verify_password(password, user.credential.clone())
        .await
    {
        counter!(LOGIN_FAILED).increment(1);
        tracing::debug!(user_id = user.id, "login rejected");
        return Err(AppError::InvalidCredentials);
    }

    let access_token = state.auth.issue_token(UserIdentity {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
    })?;

    counter!(LOGIN_SUCCEEDED).increment(1);
    tracing::info!(user_id = user.id, "user logged in");

    Ok(Json(LoginResponse {
        user_data: UserData {
            username: user.username,
            email: user.email,
        },
        access_token,
    }))
}

/// `GET /api/users/current`
pub async fn current_user(Extension(user): Extension<UserIdentity>) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        message: "User authorized!".to_string(),
        user,
    })
}
