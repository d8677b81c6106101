use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use super::{AttendanceService, FeedbackService};
use super::attendance::{AttendanceEntry, HistoryView, TodayRoster};
use super::feedback::Inbox;
use crate::aggregator::{AttendanceSummary, DailyOverview, summarize_between, week_bounds};
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::attendance::RecordQuery;
use crate::model::profile::Profile;
use crate::view::{AdminView, DashboardView, StaffView, format_rate};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StaffDashboard {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "ICP/2024/001")]
    pub staff_id: String,
    #[schema(example = "Computer Science")]
    pub department: String,
    pub is_checked_in: bool,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub last_check_in: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub last_check_out: Option<DateTime<Utc>>,
    pub today: Option<AttendanceEntry>,
    pub this_week: AttendanceSummary,
    #[schema(example = "100%")]
    pub this_week_rate_text: String,
    pub unread_messages: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminDashboard {
    pub overview: DailyOverview,
    #[schema(example = "91%")]
    pub attendance_rate_text: String,
}

/// Content for the selected view, tagged with its name.
#[derive(Debug, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum DashboardPayload {
    StaffDashboard(StaffDashboard),
    CheckIn(StaffDashboard),
    History(HistoryView),
    Messages(Inbox),
    AdminDashboard(AdminDashboard),
    Attendance(TodayRoster),
    Feedback(Vec<Profile>),
}

pub async fn staff_dashboard(
    attendance: &AttendanceService,
    feedback: &FeedbackService,
    profile: Option<Profile>,
    user_id: u64,
    now: DateTime<Utc>,
) -> Result<StaffDashboard, AppError> {
    let records = attendance.records(&RecordQuery::for_user(user_id)).await?;
    let today = attendance.policy().local_date(now);
    let (monday, sunday) = week_bounds(today);
    let this_week = summarize_between(&records, monday, sunday);

    let todays = records.iter().find(|r| r.date == today);
    let unread_messages = feedback.unread_count(user_id).await?;

    let (name, staff_id, department) = match profile {
        Some(p) => (p.full_name(), p.staff_id, p.department),
        None => ("Unknown".to_string(), "N/A".to_string(), "N/A".to_string()),
    };

    Ok(StaffDashboard {
        name,
        staff_id,
        department,
        is_checked_in: todays.is_some_and(|r| r.is_checked_in()),
        last_check_in: records.iter().find_map(|r| r.check_in_time),
        last_check_out: records.iter().find_map(|r| r.check_out_time),
        today: todays.map(|r| attendance.entry(r)),
        this_week_rate_text: format_rate(this_week.attendance_rate),
        this_week,
        unread_messages,
    })
}

pub async fn build(
    view: DashboardView,
    user: &AuthUser,
    profile: Option<Profile>,
    attendance: &AttendanceService,
    feedback: &FeedbackService,
    now: DateTime<Utc>,
) -> Result<DashboardPayload, AppError> {
    let payload = match view {
        DashboardView::Staff(StaffView::Dashboard) => DashboardPayload::StaffDashboard(
            staff_dashboard(attendance, feedback, profile, user.user_id, now).await?,
        ),
        DashboardView::Staff(StaffView::CheckIn) => DashboardPayload::CheckIn(
            staff_dashboard(attendance, feedback, profile, user.user_id, now).await?,
        ),
        DashboardView::Staff(StaffView::History) => {
            DashboardPayload::History(attendance.history(user.user_id, None, None).await?)
        }
        DashboardView::Staff(StaffView::Messages) => {
            DashboardPayload::Messages(feedback.inbox(user.user_id).await?)
        }
        DashboardView::Admin(AdminView::Dashboard) => {
            let roster = attendance.today_roster(now).await?;
            DashboardPayload::AdminDashboard(AdminDashboard {
                overview: roster.overview,
                attendance_rate_text: roster.attendance_rate_text,
            })
        }
        DashboardView::Admin(AdminView::Attendance) => {
            DashboardPayload::Attendance(attendance.today_roster(now).await?)
        }
        DashboardView::Admin(AdminView::Feedback) => {
            DashboardPayload::Feedback(feedback.staff_members().await?)
        }
    };
    Ok(payload)
}

/// Profile of the current session; a missing profile degrades to defaults.
pub async fn session_profile(
    attendance: &AttendanceService,
    user_id: u64,
) -> Result<Option<Profile>, AppError> {
    match attendance.profile(user_id).await {
        Ok(profile) => Ok(Some(profile)),
        Err(AppError::NotFound(_)) => {
            warn!(user_id, "No profile for authenticated user");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
