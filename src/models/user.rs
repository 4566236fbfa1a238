//! Staff account model.

use serde::{Deserialize, Serialize};

/// Staff role. Admin is not a stored user; it logs in against configured
/// credentials and carries the `system admin` role in its token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "dep-head")]
    DepHead,
    #[serde(rename = "teacher")]
    Teacher,
    #[serde(rename = "procter")]
    Procter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::DepHead => "dep-head",
            Role::Teacher => "teacher",
            Role::Procter => "procter",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dep-head" => Some(Role::DepHead),
            "teacher" => Some(Role::Teacher),
            "procter" => Some(Role::Procter),
            _ => None,
        }
    }
}

/// A staff account. Credential material never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub salt: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a staff account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
}

/// Request body for updating a staff account (no credential changes here).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
}

/// Request body for the dedicated password-change operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub password: String,
}

/// Request body for staff and admin login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Identity block returned by login and checkauth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

/// Response body for successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user: SessionUser,
    pub token: String,
}
