//! Department API endpoints.

use axum::{extract::State, http::StatusCode, Json};

use super::Created;
use crate::errors::AppError;
use crate::models::{CreateDepartmentRequest, Department};
use crate::AppState;

/// POST /api/department/add-department - Create a department.
///
/// The parent school is checked synchronously before the insert; a missing
/// parent is a 404 and nothing is written.
pub async fn add_department(
    State(state): State<AppState>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<(StatusCode, Json<Created<Department>>), AppError> {
    if request.name.trim().is_empty() || request.school_id.trim().is_empty() {
        return Err(AppError::Validation(
            "name and schoolId are required".to_string(),
        ));
    }

    if state.repo.get_school(&request.school_id).await?.is_none() {
        return Err(AppError::NotFound(
            "School not found with the provided schoolId".to_string(),
        ));
    }

    let department = state.repo.create_department(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "Department added successfully".to_string(),
            data: department,
        }),
    ))
}

/// GET /api/department/get-department - List all departments.
pub async fn get_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Department>>, AppError> {
    Ok(Json(state.repo.list_departments().await?))
}
