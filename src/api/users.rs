//! Staff account API endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;

use super::Message;
use crate::auth::{self, AuthClaims};
use crate::errors::AppError;
use crate::models::{
    CreateUserRequest, LoginRequest, LoginResponse, SessionUser, UpdatePasswordRequest,
    UpdateUserRequest, User,
};
use crate::AppState;

/// Response body for checkauth.
#[derive(Debug, Serialize)]
pub struct CheckAuthResponse {
    pub success: bool,
    pub user: SessionUser,
}

/// Response body for the active-users stats endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUsersResponse {
    pub total: i64,
    pub by_role: BTreeMap<String, i64>,
}

/// POST /api/users/create - Create a staff account.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    if request.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }
    if request.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    if state
        .repo
        .find_user_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(AppError::Validation("Email already registered".to_string()));
    }

    let salt = auth::generate_salt();
    let password_hash = auth::hash_password(&request.password, &salt);
    let user = state.repo.create_user(&request, &password_hash, &salt).await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/users/login - Log in a staff account.
pub async fn login_user(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .repo
        .find_user_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !auth::verify_password(&request.password, &user.salt, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let role = user.role.as_str();
    let token = auth::issue_token(&state.config.jwt_secret, &user.id, &user.email, role)?;

    Ok(Json(LoginResponse {
        success: true,
        user: SessionUser {
            id: user.id,
            email: user.email,
            name: user.full_name,
            role: role.to_string(),
        },
        token,
    }))
}

/// POST /api/users/logout - End a session.
///
/// Tokens are stateless; the client discards its copy.
pub async fn logout_user() -> Json<Message> {
    Json(Message::new("Logged out successfully"))
}

/// GET /api/users/get-users - List all staff accounts.
pub async fn get_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.repo.list_users().await?))
}

/// GET /api/users/get-profile - Get the calling staff account.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<User>, AppError> {
    state
        .repo
        .get_user(&claims.sub)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// GET /api/users/checkauth - Validate the caller's token.
pub async fn check_auth(
    State(state): State<AppState>,
    Extension(claims): Extension<AuthClaims>,
) -> Result<Json<CheckAuthResponse>, AppError> {
    let name = if claims.role == auth::ADMIN_ROLE {
        "System Admin".to_string()
    } else {
        state
            .repo
            .get_user(&claims.sub)
            .await?
            .map(|u| u.full_name)
            .unwrap_or_else(|| claims.email.clone())
    };

    Ok(Json(CheckAuthResponse {
        success: true,
        user: SessionUser {
            id: claims.sub,
            email: claims.email,
            name,
            role: claims.role,
        },
    }))
}

/// GET /api/users/active-users - Staff counts grouped by role.
pub async fn active_users(
    State(state): State<AppState>,
) -> Result<Json<ActiveUsersResponse>, AppError> {
    let counts = state.repo.count_users_by_role().await?;
    let total = counts.iter().map(|(_, n)| n).sum();
    let by_role = counts.into_iter().collect();

    Ok(Json(ActiveUsersResponse { total, by_role }))
}

/// PUT /api/users/update-user/{id} - Update a staff account.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    if let Some(email) = &request.email {
        if let Some(existing) = state.repo.find_user_by_email(email).await? {
            if existing.id != id {
                return Err(AppError::Validation(
                    "Email already used by another user".to_string(),
                ));
            }
        }
    }

    let user = state.repo.update_user(&id, &request).await?;
    Ok(Json(user))
}

/// PUT /api/users/update-password/{id} - Replace a staff account's password.
pub async fn update_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePasswordRequest>,
) -> Result<Json<Message>, AppError> {
    if request.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    let salt = auth::generate_salt();
    let password_hash = auth::hash_password(&request.password, &salt);
    state
        .repo
        .update_user_password(&id, &password_hash, &salt)
        .await?;

    Ok(Json(Message::new("Password updated successfully")))
}
