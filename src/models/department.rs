//! Department model. Each department belongs to exactly one school.

use serde::{Deserialize, Serialize};

use super::School;

/// A department within a school.
///
/// List responses embed the parent school for the frontend; the embed is
/// absent only if the parent row has gone missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub school_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<School>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a new department.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub school_id: String,
}
