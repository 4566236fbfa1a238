//! Daily attendance API endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::Message;
use crate::errors::AppError;
use crate::models::{DailyAttendanceRecord, DailyMark};
use crate::reconcile;
use crate::AppState;

/// Query parameters for the monthly range fetch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAttendanceQuery {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
}

/// Query parameters for the single-record delete.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAttendanceQuery {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// POST /api/attendances/save-attendance - Reconcile a daily batch.
///
/// The whole batch is validated before the first write; a malformed record
/// anywhere rejects everything (400) and nothing is persisted.
pub async fn save_attendance(
    State(state): State<AppState>,
    Json(marks): Json<Vec<DailyMark>>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let writes = reconcile::plan_daily(&marks)?;
    let processed = state.repo.apply_daily_writes(&writes).await?;
    tracing::debug!(processed, "daily attendance batch reconciled");

    Ok((
        StatusCode::CREATED,
        Json(Message::new("Attendance records saved successfully")),
    ))
}

/// GET /api/attendances/get-attendance - Fetch a month of daily records,
/// optionally for one student (`studentId=all` or omitted means everyone).
pub async fn get_attendance(
    State(state): State<AppState>,
    Query(query): Query<GetAttendanceQuery>,
) -> Result<Json<Vec<DailyAttendanceRecord>>, AppError> {
    let (Some(month), Some(year)) = (query.month, query.year) else {
        return Err(AppError::Validation(
            "Month and year are required".to_string(),
        ));
    };

    let (from, to) = reconcile::month_range(month, year)?;
    let student_id = query
        .student_id
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "all");

    let records = state.repo.fetch_daily_range(student_id, from, to).await?;
    Ok(Json(records))
}

/// DELETE /api/attendances/delete - Remove one daily record by its
/// composite key. 404 when the key is absent.
pub async fn delete_attendance(
    State(state): State<AppState>,
    Query(query): Query<DeleteAttendanceQuery>,
) -> Result<Json<Message>, AppError> {
    let (Some(student_id), Some(date_raw)) = (query.student_id, query.date) else {
        return Err(AppError::Validation(
            "studentId and date are required".to_string(),
        ));
    };

    let date = reconcile::parse_date(&date_raw)
        .ok_or_else(|| AppError::Validation("Invalid date format".to_string()))?;

    state.repo.delete_daily(&student_id, date).await?;

    Ok(Json(Message::new("Attendance deleted successfully")))
}
