//! Attendance reconciliation engine.
//!
//! Turns a batch of desired presence states into the writes that make
//! persisted attendance match it. Planning is a pure validation pass that
//! either accepts the whole batch or rejects it before any write is issued;
//! application happens in the repository, one independent upsert or delete
//! per composite key.
//!
//! Domain rule: absence is the default, derived state. Presence is the only
//! persisted fact, so a mark of `present = false` plans a deletion of the
//! (studentId, date) row rather than storing a false row.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};

use crate::errors::AppError;
use crate::models::{DailyMark, ScheduleEntry, StudentSlotMarks};

/// A single planned write against the daily attendance store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyWrite {
    Upsert { student_id: String, date: NaiveDate },
    Delete { student_id: String, date: NaiveDate },
}

/// Validate a raw daily batch and plan its writes.
///
/// Fail-fast: every mark is validated before the first write is planned,
/// so a malformed record anywhere in the batch rejects the batch as a
/// whole and nothing is persisted.
pub fn plan_daily(marks: &[DailyMark]) -> Result<Vec<DailyWrite>, AppError> {
    let mut writes = Vec::with_capacity(marks.len());

    for (i, mark) in marks.iter().enumerate() {
        if mark.student_id.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Record at index {} is missing a studentId",
                i
            )));
        }

        let date = parse_date(&mark.date).ok_or_else(|| {
            AppError::Validation(format!("Invalid date format at index {}: {}", i, mark.date))
        })?;

        let present = mark.present.as_bool().ok_or_else(|| {
            AppError::Validation(format!("Invalid present value at index {}", i))
        })?;

        let student_id = mark.student_id.clone();
        writes.push(if present {
            DailyWrite::Upsert { student_id, date }
        } else {
            DailyWrite::Delete { student_id, date }
        });
    }

    Ok(writes)
}

/// Parse a submitted date: `YYYY-MM-DD`, or an RFC 3339 timestamp whose
/// calendar date is taken.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Inclusive first-to-last-day range for a month/year.
pub fn month_range(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate), AppError> {
    let from = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::Validation(format!("Invalid month/year: {}/{}", month, year)))?;

    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let to = next_month
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| AppError::Validation(format!("Invalid month/year: {}/{}", month, year)))?;

    Ok((from, to))
}

/// Fold a just-reconciled slot batch into present counts per scheduled
/// session, keyed `"{weekday}-{slot}-{course}"`.
///
/// Pure and stateless; an empty schedule or empty batch yields an empty
/// map.
pub fn present_counts(
    schedule: &[ScheduleEntry],
    batch: &[StudentSlotMarks],
) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();

    for entry in schedule {
        let count = batch
            .iter()
            .filter(|marks| {
                marks
                    .attendance
                    .get(&entry.day)
                    .is_some_and(|slots| slots.contains_key(&entry.time))
            })
            .count();

        summary.insert(
            format!("{}-{}-{}", entry.day.as_str(), entry.time.as_str(), entry.course),
            count,
        );
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PresentValue, SlotStatus, TimeSlot, Weekday};

    fn mark(student_id: &str, date: &str, present: PresentValue) -> DailyMark {
        DailyMark {
            student_id: student_id.to_string(),
            date: date.to_string(),
            present,
        }
    }

    #[test]
    fn test_plan_daily_upserts_and_deletes() {
        let marks = vec![
            mark("S1", "2024-05-01", PresentValue::Flag(true)),
            mark("S2", "2024-05-01", PresentValue::Flag(false)),
        ];

        let writes = plan_daily(&marks).unwrap();
        assert_eq!(
            writes,
            vec![
                DailyWrite::Upsert {
                    student_id: "S1".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                },
                DailyWrite::Delete {
                    student_id: "S2".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                },
            ]
        );
    }

    #[test]
    fn test_plan_daily_coerces_string_flags() {
        let marks = vec![
            mark("S1", "2024-05-01", PresentValue::Text("true".to_string())),
            mark("S2", "2024-05-01", PresentValue::Text("false".to_string())),
        ];

        let writes = plan_daily(&marks).unwrap();
        assert!(matches!(writes[0], DailyWrite::Upsert { .. }));
        assert!(matches!(writes[1], DailyWrite::Delete { .. }));
    }

    #[test]
    fn test_plan_daily_rejects_whole_batch_on_bad_record() {
        // A valid first record must not survive the malformed second one.
        let marks = vec![
            mark("S1", "2024-05-01", PresentValue::Flag(true)),
            mark("", "x", PresentValue::Flag(true)),
        ];

        let err = plan_daily(&marks).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_plan_daily_rejects_unparseable_date() {
        let marks = vec![mark("S1", "not-a-date", PresentValue::Flag(true))];
        let err = plan_daily(&marks).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_plan_daily_rejects_garbage_present_string() {
        let marks = vec![mark("S1", "2024-05-01", PresentValue::Text("yes".to_string()))];
        let err = plan_daily(&marks).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_parse_date_accepts_rfc3339() {
        assert_eq!(
            parse_date("2024-05-01T08:30:00+03:00"),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(parse_date("2024-05-01"), NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(parse_date("05/01/2024"), None);
    }

    #[test]
    fn test_month_range_boundaries() {
        let (from, to) = month_range(5, 2024).unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());

        // April 30 sits outside, May 31 inside.
        let apr30 = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        assert!(apr30 < from);
        let may31 = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        assert!(may31 <= to);
    }

    #[test]
    fn test_month_range_december_wraps_year() {
        let (from, to) = month_range(12, 2024).unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_month_range_rejects_bad_month() {
        assert!(month_range(13, 2024).is_err());
        assert!(month_range(0, 2024).is_err());
    }

    fn slot_marks(student_id: &str, entries: &[(Weekday, TimeSlot)]) -> StudentSlotMarks {
        let mut attendance: crate::models::SlotMap = BTreeMap::new();
        for (day, slot) in entries {
            attendance
                .entry(*day)
                .or_default()
                .insert(*slot, SlotStatus::Present);
        }
        StudentSlotMarks {
            student_id: student_id.to_string(),
            attendance,
        }
    }

    fn session(day: Weekday, time: TimeSlot, course: &str) -> ScheduleEntry {
        ScheduleEntry {
            date: None,
            day,
            time,
            course: course.to_string(),
            department: None,
        }
    }

    #[test]
    fn test_present_counts() {
        let schedule = vec![
            session(Weekday::Monday, TimeSlot::EightToTen, "Algebra"),
            session(Weekday::Monday, TimeSlot::TenToTwelve, "Physics"),
        ];
        let batch = vec![
            slot_marks("S1", &[(Weekday::Monday, TimeSlot::EightToTen)]),
            slot_marks(
                "S2",
                &[
                    (Weekday::Monday, TimeSlot::EightToTen),
                    (Weekday::Monday, TimeSlot::TenToTwelve),
                ],
            ),
            slot_marks("S3", &[]),
        ];

        let summary = present_counts(&schedule, &batch);
        assert_eq!(summary.get("Monday-8:00-10:00-Algebra"), Some(&2));
        assert_eq!(summary.get("Monday-10:00-12:00-Physics"), Some(&1));
    }

    #[test]
    fn test_present_counts_empty_inputs() {
        assert!(present_counts(&[], &[]).is_empty());

        let schedule = vec![session(Weekday::Friday, TimeSlot::ThreeToHalfPastFive, "Labs")];
        let summary = present_counts(&schedule, &[]);
        assert_eq!(summary.get("Friday-15:00-17:30-Labs"), Some(&0));
    }
}
