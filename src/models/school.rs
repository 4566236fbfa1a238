//! School model — the root of the organizational hierarchy.

use serde::{Deserialize, Serialize};

/// A school. Created once by admin action; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a new school.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSchoolRequest {
    pub name: String,
}
