//! Student roster API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::Message;
use crate::errors::AppError;
use crate::models::{CreateStudentRequest, Student, UpdateStudentRequest};
use crate::AppState;

/// Response body for a student update.
#[derive(Debug, Serialize)]
pub struct UpdatedStudent {
    pub message: String,
    pub student: Student,
}

/// GET /api/students/get-student - List all students with school and
/// department embedded.
pub async fn get_students(State(state): State<AppState>) -> Result<Json<Vec<Student>>, AppError> {
    Ok(Json(state.repo.list_students().await?))
}

/// POST /api/students/add-student - Add a new student.
pub async fn add_student(
    State(state): State<AppState>,
    Json(request): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    if request.student_id.trim().is_empty() {
        return Err(AppError::Validation("studentId is required".to_string()));
    }
    if request.full_name.trim().is_empty() {
        return Err(AppError::Validation("Full name is required".to_string()));
    }

    // Check if email already exists
    if state
        .repo
        .find_student_by_email(&request.email, None)
        .await?
        .is_some()
    {
        return Err(AppError::Validation("Email already registered".to_string()));
    }

    let student = state.repo.create_student(&request).await?;

    Ok((StatusCode::CREATED, Json(student)))
}

/// PUT /api/students/update-student/{id} - Update a student.
pub async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStudentRequest>,
) -> Result<Json<UpdatedStudent>, AppError> {
    // Email uniqueness check on update
    if let Some(email) = &request.email {
        if state
            .repo
            .find_student_by_email(email, Some(&id))
            .await?
            .is_some()
        {
            return Err(AppError::Validation(
                "Email already used by another student".to_string(),
            ));
        }
    }

    let student = state.repo.update_student(&id, &request).await?;

    Ok(Json(UpdatedStudent {
        message: "Student updated".to_string(),
        student,
    }))
}

/// DELETE /api/students/delete-record/{id} - Delete a student.
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    state.repo.delete_student(&id).await?;
    Ok(Json(Message::new("Student deleted")))
}
