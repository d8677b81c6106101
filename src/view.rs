//! Dashboard view state and display formatting.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;
use utoipa::ToSchema;

use crate::aggregator::{DurationState, WorkDuration};
use crate::model::role::Role;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StaffView {
    #[default]
    Dashboard,
    CheckIn,
    History,
    Messages,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdminView {
    #[default]
    Dashboard,
    Attendance,
    Feedback,
}

/// The screen a session lands on, chosen by role.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DashboardView {
    Staff(StaffView),
    Admin(AdminView),
}

impl DashboardView {
    /// Unknown view names fall back to the role's landing view.
    pub fn resolve(role: Role, requested: Option<&str>) -> Self {
        let requested = requested.map(str::trim).filter(|s| !s.is_empty());
        match role {
            Role::Admin => {
                DashboardView::Admin(requested.and_then(|v| v.parse().ok()).unwrap_or_default())
            }
            Role::Staff => {
                DashboardView::Staff(requested.and_then(|v| v.parse().ok()).unwrap_or_default())
            }
        }
    }
}

pub fn format_duration(duration: &WorkDuration) -> String {
    match duration.state {
        DurationState::Complete => format!("{:.1}h", duration.total_hours),
        DurationState::InProgress => "In progress".to_string(),
        DurationState::Skewed => "0.0h".to_string(),
    }
}

pub fn format_clock(at: DateTime<Utc>, offset: &FixedOffset) -> String {
    at.with_timezone(offset).format("%H:%M").to_string()
}

pub fn format_time_range(
    check_in: Option<DateTime<Utc>>,
    check_out: Option<DateTime<Utc>>,
    offset: &FixedOffset,
) -> String {
    match (check_in, check_out) {
        (Some(i), Some(o)) => format!("{} - {}", format_clock(i, offset), format_clock(o, offset)),
        (Some(i), None) => format!("Checked in at {}", format_clock(i, offset)),
        _ => "No check-in recorded".to_string(),
    }
}

pub fn format_rate(rate: f64) -> String {
    format!("{}%", rate.round() as i64)
}

pub fn format_sender(first_name: &str, last_name: &str) -> String {
    format!("From: {first_name} {last_name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::compute_duration;
    use chrono::TimeZone;

    fn wat() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    #[test]
    fn role_selects_view_family() {
        assert_eq!(
            DashboardView::resolve(Role::Admin, None),
            DashboardView::Admin(AdminView::Dashboard)
        );
        assert_eq!(
            DashboardView::resolve(Role::Staff, Some("history")),
            DashboardView::Staff(StaffView::History)
        );
        assert_eq!(
            DashboardView::resolve(Role::Staff, Some("check_in")),
            DashboardView::Staff(StaffView::CheckIn)
        );
    }

    #[test]
    fn unknown_view_falls_back_to_landing() {
        assert_eq!(
            DashboardView::resolve(Role::Staff, Some("attendance")),
            DashboardView::Staff(StaffView::Dashboard)
        );
        assert_eq!(
            DashboardView::resolve(Role::Admin, Some("")),
            DashboardView::Admin(AdminView::Dashboard)
        );
    }

    #[test]
    fn duration_text() {
        let i = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let o = Utc.with_ymd_and_hms(2024, 1, 15, 16, 18, 0).unwrap();
        assert_eq!(format_duration(&compute_duration(Some(i), Some(o))), "8.3h");
        assert_eq!(format_duration(&compute_duration(Some(i), None)), "In progress");
    }

    #[test]
    fn time_range_uses_workday_offset() {
        let i = Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap();
        let o = Utc.with_ymd_and_hms(2024, 1, 15, 16, 30, 0).unwrap();
        assert_eq!(format_time_range(Some(i), Some(o), &wat()), "09:00 - 17:30");
        assert_eq!(format_time_range(Some(i), None, &wat()), "Checked in at 09:00");
        assert_eq!(format_time_range(None, None, &wat()), "No check-in recorded");
    }

    #[test]
    fn rate_is_rounded() {
        assert_eq!(format_rate(66.666), "67%");
        assert_eq!(format_rate(0.0), "0%");
    }
}
