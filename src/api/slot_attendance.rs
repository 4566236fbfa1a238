//! Per-slot attendance API endpoints.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::SaveSlotAttendanceRequest;
use crate::reconcile;
use crate::AppState;

/// Response body for the slot save: confirmation plus, when a schedule was
/// supplied, present counts per scheduled session.
#[derive(Debug, Serialize)]
pub struct SaveSlotResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BTreeMap<String, usize>>,
}

/// POST /api/Tattendances/save-attendance - Upsert one slot document per
/// student for the given date.
///
/// Each student's document is replaced wholesale (last writer wins);
/// resubmitting the same (studentId, date) never creates a second row.
/// Entries with an empty studentId or no marks are skipped.
pub async fn save_slot_attendance(
    State(state): State<AppState>,
    Json(request): Json<SaveSlotAttendanceRequest>,
) -> Result<Json<SaveSlotResponse>, AppError> {
    let date = reconcile::parse_date(&request.date).ok_or_else(|| {
        AppError::Validation("Invalid attendance data or missing date".to_string())
    })?;

    let mut saved = 0usize;
    for marks in &request.attendance {
        if marks.student_id.trim().is_empty() || marks.attendance.is_empty() {
            continue;
        }
        state
            .repo
            .upsert_slot(&marks.student_id, date, &marks.attendance)
            .await?;
        saved += 1;
    }
    tracing::debug!(saved, %date, "slot attendance batch reconciled");

    let summary = request
        .schedule
        .as_deref()
        .map(|schedule| reconcile::present_counts(schedule, &request.attendance));

    Ok(Json(SaveSlotResponse {
        message: "Attendance saved successfully".to_string(),
        summary,
    }))
}
