//! Course model. Each course belongs to exactly one department.

use serde::{Deserialize, Serialize};

use super::Department;

/// A course offered by a department.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub department_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a new course.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub name: String,
    pub department_id: String,
}
