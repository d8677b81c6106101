use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    /// Present and late both count as attended.
    pub fn is_attended(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "2024-01-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "2024-01-15T08:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(example = "2024-01-15T16:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub check_out_time: Option<DateTime<Utc>>,
    /// Stored as text; values outside the known statuses are kept verbatim.
    #[schema(example = "present")]
    pub status: String,
}

impl AttendanceRecord {
    pub fn status(&self) -> Option<AttendanceStatus> {
        self.status.parse().ok()
    }

    pub fn is_checked_in(&self) -> bool {
        self.check_in_time.is_some() && self.check_out_time.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: u64,
    pub date: NaiveDate,
    pub check_in_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum RecordOrder {
    #[default]
    DateDesc,
    CheckInDesc,
}

/// Filter for attendance reads. Date bounds are inclusive.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct RecordQuery {
    pub user_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub order: RecordOrder,
}

impl RecordQuery {
    pub fn for_user(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn on_date(date: NaiveDate) -> Self {
        Self {
            from: Some(date),
            to: Some(date),
            order: RecordOrder::CheckInDesc,
            ..Default::default()
        }
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.user_id.is_none_or(|id| id == record.user_id)
            && self.from.is_none_or(|from| record.date >= from)
            && self.to.is_none_or(|to| record.date <= to)
    }
}
