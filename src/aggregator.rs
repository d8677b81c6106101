//! Attendance aggregation.
//!
//! Pure functions turning raw attendance records into display-ready
//! metrics. Nothing here performs I/O or keeps state between calls, so the
//! same input always produces the same output no matter how often a view is
//! recomputed.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DurationState {
    /// Both timestamps present and ordered.
    Complete,
    /// Check-in or check-out still missing.
    InProgress,
    /// Check-out precedes check-in. Reported as zero; callers should log it.
    Skewed,
}

/// Time worked between a check-in and a check-out.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, ToSchema)]
pub struct WorkDuration {
    #[schema(example = 7)]
    pub hours: i64,
    /// Minutes left over after whole hours.
    #[schema(example = 45)]
    pub minutes: i64,
    /// Whole minutes expressed in hours, e.g. 7h45m is 7.75.
    #[schema(example = 7.75)]
    pub total_hours: f64,
    pub state: DurationState,
}

impl WorkDuration {
    fn zero(state: DurationState) -> Self {
        Self {
            hours: 0,
            minutes: 0,
            total_hours: 0.0,
            state,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == DurationState::Complete
    }
}

pub fn compute_duration(
    check_in: Option<DateTime<Utc>>,
    check_out: Option<DateTime<Utc>>,
) -> WorkDuration {
    let (Some(check_in), Some(check_out)) = (check_in, check_out) else {
        return WorkDuration::zero(DurationState::InProgress);
    };

    if check_out < check_in {
        return WorkDuration::zero(DurationState::Skewed);
    }

    // floor(delta_ms / 60_000); the delta is non-negative here
    let whole_minutes = (check_out - check_in).num_milliseconds() / 60_000;

    WorkDuration {
        hours: whole_minutes / 60,
        minutes: whole_minutes % 60,
        total_hours: whole_minutes as f64 / 60.0,
        state: DurationState::Complete,
    }
}

pub fn record_duration(record: &AttendanceRecord) -> WorkDuration {
    compute_duration(record.check_in_time, record.check_out_time)
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct AttendanceSummary {
    #[schema(example = 3)]
    pub total_days: usize,
    #[schema(example = 2)]
    pub present_days: usize,
    #[schema(example = 15.75)]
    pub total_hours: f64,
    /// Percentage in `[0, 100]`.
    #[schema(example = 66.67)]
    pub attendance_rate: f64,
    #[schema(example = 7.875)]
    pub average_hours_per_present_day: f64,
}

/// Totals over a set of records.
///
/// Late arrivals count as present. Both ratios are defined as zero when
/// their denominator is zero.
pub fn summarize(records: &[AttendanceRecord]) -> AttendanceSummary {
    let total_days = records.len();
    let present_days = records
        .iter()
        .filter(|r| r.status().is_some_and(|s| s.is_attended()))
        .count();
    let total_hours: f64 = records.iter().map(|r| record_duration(r).total_hours).sum();

    let attendance_rate = if total_days == 0 {
        0.0
    } else {
        present_days as f64 / total_days as f64 * 100.0
    };

    let average_hours_per_present_day = if present_days == 0 {
        0.0
    } else {
        total_hours / present_days as f64
    };

    AttendanceSummary {
        total_days,
        present_days,
        total_hours,
        attendance_rate,
        average_hours_per_present_day,
    }
}

/// Summary restricted to records dated within `from..=to`.
pub fn summarize_between(
    records: &[AttendanceRecord],
    from: NaiveDate,
    to: NaiveDate,
) -> AttendanceSummary {
    let in_range: Vec<AttendanceRecord> = records
        .iter()
        .filter(|r| r.date >= from && r.date <= to)
        .cloned()
        .collect();
    summarize(&in_range)
}

/// Monday and Sunday of the ISO week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = date.weekday().num_days_from_monday() as i64;
    let monday = date - Duration::days(offset);
    (monday, monday + Duration::days(6))
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatusBadge {
    Affirmative,
    Cautionary,
    Negative,
    Unknown,
}

impl StatusBadge {
    pub fn label(&self) -> &'static str {
        match self {
            StatusBadge::Affirmative => "Present",
            StatusBadge::Cautionary => "Late",
            StatusBadge::Negative => "Absent",
            StatusBadge::Unknown => "Unknown",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            StatusBadge::Affirmative => "check-circle",
            StatusBadge::Cautionary => "clock",
            StatusBadge::Negative => "x-circle",
            StatusBadge::Unknown => "clock",
        }
    }
}

pub fn classify_status(status: &str) -> StatusBadge {
    match status.parse::<AttendanceStatus>() {
        Ok(AttendanceStatus::Present) => StatusBadge::Affirmative,
        Ok(AttendanceStatus::Late) => StatusBadge::Cautionary,
        Ok(AttendanceStatus::Absent) => StatusBadge::Negative,
        Err(_) => StatusBadge::Unknown,
    }
}

/// Headline numbers for one day across the whole staff.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyOverview {
    #[schema(example = "2024-01-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub total_staff: usize,
    pub present: usize,
    pub late: usize,
    /// Explicit absences plus staff without any record that day.
    pub absent: usize,
    pub checked_out: usize,
    pub total_hours: f64,
    pub attendance_rate: f64,
}

/// Overview of `date` over the members of `staff`.
///
/// Records of anyone outside `staff` (admins, unknown users) are ignored, so
/// they can neither fill a staff slot nor push the rate above 100%.
pub fn daily_overview(
    date: NaiveDate,
    records: &[AttendanceRecord],
    staff: &HashSet<u64>,
) -> DailyOverview {
    // One record per user and day; keep the first if the input repeats one
    let mut seen = HashSet::with_capacity(staff.len());
    let todays: Vec<&AttendanceRecord> = records
        .iter()
        .filter(|r| r.date == date && staff.contains(&r.user_id) && seen.insert(r.user_id))
        .collect();

    let count = |status: AttendanceStatus| {
        todays
            .iter()
            .filter(|r| r.status() == Some(status))
            .count()
    };
    let present = count(AttendanceStatus::Present);
    let late = count(AttendanceStatus::Late);
    let total_staff = staff.len();
    let absent = total_staff - present - late;

    let checked_out = todays
        .iter()
        .filter(|r| record_duration(r).is_complete())
        .count();
    let total_hours = todays.iter().map(|r| record_duration(r).total_hours).sum();

    let attendance_rate = if total_staff == 0 {
        0.0
    } else {
        (present + late) as f64 / total_staff as f64 * 100.0
    };

    DailyOverview {
        date,
        total_staff,
        present,
        late,
        absent,
        checked_out,
        total_hours,
        attendance_rate,
    }
}
