//! Attendance record shapes.
//!
//! Two record kinds exist side by side: a per-date boolean presence row
//! keyed by (studentId, date), and a per-schedule-slot document keyed the
//! same way. The domain rule for both: absence is the default, derived
//! state — presence is the only persisted fact.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A persisted daily presence row. One per student per date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttendanceRecord {
    pub student_id: String,
    pub present: bool,
    pub date: NaiveDate,
}

/// A raw daily mark as submitted by the frontend, before validation.
///
/// `date` stays a string here — parsing happens in the fail-fast
/// validation pass, so one malformed date rejects the whole batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMark {
    pub student_id: String,
    pub date: String,
    pub present: PresentValue,
}

/// Presence flag accepting a boolean or its `"true"`/`"false"` string form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PresentValue {
    Flag(bool),
    Text(String),
}

impl PresentValue {
    /// Coerce to a boolean. Strings other than `"true"`/`"false"` are
    /// malformed and yield `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PresentValue::Flag(b) => Some(*b),
            PresentValue::Text(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
        }
    }
}

/// Weekday of a class session. Weekend days are not schedulable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
        }
    }
}

/// Time range of a class session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeSlot {
    #[serde(rename = "8:00-10:00")]
    EightToTen,
    #[serde(rename = "10:00-12:00")]
    TenToTwelve,
    #[serde(rename = "13:30-15:00")]
    HalfPastOneToThree,
    #[serde(rename = "15:00-17:30")]
    ThreeToHalfPastFive,
}

impl TimeSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeSlot::EightToTen => "8:00-10:00",
            TimeSlot::TenToTwelve => "10:00-12:00",
            TimeSlot::HalfPastOneToThree => "13:30-15:00",
            TimeSlot::ThreeToHalfPastFive => "15:00-17:30",
        }
    }
}

/// Per-slot presence status. Only presence is recorded; an absent slot
/// simply has no entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SlotStatus {
    Present,
}

/// Nested presence structure: weekday → slot → status.
///
/// Typed enums at every level so malformed keys are rejected at the
/// boundary instead of silently persisting.
pub type SlotMap = BTreeMap<Weekday, BTreeMap<TimeSlot, SlotStatus>>;

/// A persisted per-slot attendance document. Unique per (studentId, date).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub date: NaiveDate,
    pub attendance: SlotMap,
    pub created_at: String,
    pub updated_at: String,
}

/// One student's slot marks within a submission batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSlotMarks {
    pub student_id: String,
    pub attendance: SlotMap,
}

/// One session the teacher scheduled for the submission, used for the
/// present-count summary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    #[serde(default)]
    pub date: Option<String>,
    pub day: Weekday,
    pub time: TimeSlot,
    pub course: String,
    #[serde(default)]
    pub department: Option<String>,
}

/// Request body for the slot attendance save endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSlotAttendanceRequest {
    pub attendance: Vec<StudentSlotMarks>,
    pub date: String,
    #[serde(default)]
    pub schedule: Option<Vec<ScheduleEntry>>,
}
