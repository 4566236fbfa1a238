//! Student model matching the frontend Student interface.

use serde::{Deserialize, Serialize};

use super::{Department, School};

/// Enrollment year classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Year {
    #[serde(rename = "1st")]
    First,
    #[serde(rename = "2nd")]
    Second,
    #[serde(rename = "3rd")]
    Third,
    #[serde(rename = "4th")]
    Fourth,
    #[serde(rename = "5th")]
    Fifth,
    #[serde(rename = "6th")]
    Sixth,
}

impl Year {
    pub fn as_str(&self) -> &'static str {
        match self {
            Year::First => "1st",
            Year::Second => "2nd",
            Year::Third => "3rd",
            Year::Fourth => "4th",
            Year::Fifth => "5th",
            Year::Sixth => "6th",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1st" => Some(Year::First),
            "2nd" => Some(Year::Second),
            "3rd" => Some(Year::Third),
            "4th" => Some(Year::Fourth),
            "5th" => Some(Year::Fifth),
            "6th" => Some(Year::Sixth),
            _ => None,
        }
    }
}

/// A student on the roster.
///
/// `student_id` is the business identifier used for attendance keys,
/// distinct from the storage `id`. Department and school affiliations are
/// optional — a student may be unaffiliated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub student_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub year: Year,
    pub block: String,
    pub dorm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Department>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<School>,
}

/// Request body for adding a new student.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    pub student_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub year: Year,
    pub block: String,
    pub dorm: String,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub school_id: Option<String>,
}

/// Request body for updating an existing student.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub year: Option<Year>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub dorm: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub school_id: Option<String>,
}
