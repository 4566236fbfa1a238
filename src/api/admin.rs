//! Admin login endpoint.
//!
//! The admin account is not a stored user; it authenticates against
//! credentials from the environment and receives a token with the
//! `system admin` role.

use axum::{extract::State, Json};

use crate::auth;
use crate::errors::AppError;
use crate::models::{LoginRequest, LoginResponse, SessionUser};
use crate::AppState;

/// Fixed identity for the admin session.
const ADMIN_ID: &str = "admin-001";

/// POST /api/admin/login - Log in as the system admin.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (Some(expected_email), Some(expected_password)) = (
        state.config.admin_email.as_deref(),
        state.config.admin_password.as_deref(),
    ) else {
        // No credentials configured, admin login is disabled.
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let email_ok = auth::constant_time_compare(&request.email, expected_email);
    let password_ok = auth::constant_time_compare(&request.password, expected_password);
    if !(email_ok && password_ok) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = auth::issue_token(
        &state.config.jwt_secret,
        ADMIN_ID,
        &request.email,
        auth::ADMIN_ROLE,
    )?;

    Ok(Json(LoginResponse {
        success: true,
        user: SessionUser {
            id: ADMIN_ID.to_string(),
            email: request.email,
            name: "System Admin".to_string(),
            role: auth::ADMIN_ROLE.to_string(),
        },
        token,
    }))
}
