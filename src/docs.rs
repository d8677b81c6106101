use crate::aggregator::{AttendanceSummary, DailyOverview, DurationState, StatusBadge, WorkDuration};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::feedback::FeedbackMessage;
use crate::model::profile::Profile;
use crate::model::role::Role;
use crate::service::attendance::{AttendanceEntry, HistoryView, RosterEntry, TodayRoster};
use crate::service::dashboard::{AdminDashboard, StaffDashboard};
use crate::service::feedback::{Inbox, InboxMessage, SendFeedback};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staff Attendance API",
        version = "1.0.0",
        description = r#"
## Staff Attendance & Feedback

Daily attendance tracking for staff, with an admin view of who is in today
and a one-way feedback channel from admins to staff.

### 🔹 Key Features
- **Attendance**
  - Daily check-in and check-out, late detection, history with summary statistics
- **Admin overview**
  - Today's roster with present, late and absent counts and the attendance rate
- **Feedback**
  - Admins message staff; staff read their inbox and mark messages as read
- **Dashboard**
  - One endpoint serving the content of each role's dashboard view

### 🔐 Security
Every endpoint requires a **JWT Bearer** token issued by the identity provider.
Roster, staff list and sending feedback are **Admin** only.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::history,
        crate::api::attendance::today,

        crate::api::feedback::send_message,
        crate::api::feedback::inbox,
        crate::api::feedback::mark_read,
        crate::api::feedback::staff_members,

        crate::api::dashboard::dashboard
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            AttendanceEntry,
            AttendanceSummary,
            WorkDuration,
            DurationState,
            StatusBadge,
            HistoryView,
            DailyOverview,
            RosterEntry,
            TodayRoster,
            FeedbackMessage,
            SendFeedback,
            InboxMessage,
            Inbox,
            Profile,
            Role,
            StaffDashboard,
            AdminDashboard
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Attendance", description = "Check-in, check-out and attendance history"),
        (name = "Feedback", description = "Admin to staff messages"),
        (name = "Dashboard", description = "Per-role dashboard views"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/attendance/check-in",
            "/api/attendance/check-out",
            "/api/attendance/history",
            "/api/attendance/today",
            "/api/feedback",
            "/api/feedback/{message_id}/read",
            "/api/staff",
            "/api/dashboard",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
        let schemes = doc.components.map(|c| c.security_schemes).unwrap_or_default();
        assert!(schemes.contains_key("bearer_auth"));
    }
}
