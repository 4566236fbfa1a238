//! School API endpoints.

use axum::{extract::State, http::StatusCode, Json};

use super::Created;
use crate::errors::AppError;
use crate::models::{CreateSchoolRequest, School};
use crate::AppState;

/// POST /api/school/add-school - Create a school.
pub async fn add_school(
    State(state): State<AppState>,
    Json(request): Json<CreateSchoolRequest>,
) -> Result<(StatusCode, Json<Created<School>>), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("School name is required".to_string()));
    }

    let school = state.repo.create_school(request.name.trim()).await?;

    Ok((
        StatusCode::CREATED,
        Json(Created {
            message: "School added successfully".to_string(),
            data: school,
        }),
    ))
}

/// GET /api/school/get-school - List all schools.
pub async fn get_schools(State(state): State<AppState>) -> Result<Json<Vec<School>>, AppError> {
    Ok(Json(state.repo.list_schools().await?))
}
