//! Course API endpoints.

use axum::{extract::State, http::StatusCode, Json};

use super::Created;
use crate::errors::AppError;
use crate::models::{Course, CreateCourseRequest};
use crate::AppState;

/// POST /api/course/add-course - Create a course.
///
/// The parent department is checked synchronously before the insert; a
/// missing parent is a 404 and nothing is written.
pub async fn add_course(
    State(state): State<AppState>,
    Json(request): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Created<Course>>), AppError> {
    if request.name.trim().is_empty() || request.department_id.trim().is_empty() {
        return Err(AppError::Validation(
            "name and departmentId are required".to_string(),
        ));
    }

    if state
        .repo
        .get_department(&request.department_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(
            "Department not found with the provided departmentId".to_string(),
        ));
    }

    let course = state.repo.create_course(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Course added successfully".to_string(),
            data: course,
        }),
    ))
}

/// GET /api/course/get-course - List all courses.
pub async fn get_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, AppError> {
    Ok(Json(state.repo.list_courses().await?))
}
