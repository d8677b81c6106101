use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use super::{CheckInPolicy, cached_staff};
use crate::aggregator::{
    AttendanceSummary, DailyOverview, DurationState, StatusBadge, WorkDuration, classify_status,
    daily_overview, record_duration, summarize,
};
use crate::error::{AppError, StoreError};
use crate::model::attendance::{AttendanceRecord, NewAttendance, RecordQuery};
use crate::model::profile::Profile;
use crate::model::role::Role;
use crate::store::{ProfileDirectory, RecordStore};
use crate::utils::join::join_by_key;
use crate::utils::read_cache::ReadCache;
use crate::view::{format_duration, format_rate, format_time_range};

/// One attendance record ready for display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceEntry {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "2024-01-15", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub check_out_time: Option<DateTime<Utc>>,
    #[schema(example = "present")]
    pub status: String,
    pub badge: StatusBadge,
    #[schema(example = "Present")]
    pub label: String,
    #[schema(example = "check-circle")]
    pub icon: String,
    #[schema(example = "09:00 - 17:00")]
    pub time_range: String,
    pub duration: WorkDuration,
    #[schema(example = "8.0h")]
    pub duration_text: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryView {
    pub summary: AttendanceSummary,
    #[schema(example = "67%")]
    pub attendance_rate_text: String,
    pub records: Vec<AttendanceEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosterEntry {
    pub user_id: u64,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "ICP/2024/001")]
    pub staff_id: String,
    #[schema(example = "Computer Science")]
    pub department: String,
    pub attendance: AttendanceEntry,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TodayRoster {
    pub overview: DailyOverview,
    #[schema(example = "91%")]
    pub attendance_rate_text: String,
    pub entries: Vec<RosterEntry>,
}

#[derive(Clone)]
pub struct AttendanceService {
    records: Arc<dyn RecordStore>,
    profiles: Arc<dyn ProfileDirectory>,
    cache: ReadCache,
    policy: CheckInPolicy,
}

impl AttendanceService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        profiles: Arc<dyn ProfileDirectory>,
        cache: ReadCache,
        policy: CheckInPolicy,
    ) -> Self {
        Self {
            records,
            profiles,
            cache,
            policy,
        }
    }

    pub fn policy(&self) -> &CheckInPolicy {
        &self.policy
    }

    pub fn entry(&self, record: &AttendanceRecord) -> AttendanceEntry {
        let duration = record_duration(record);
        if duration.state == DurationState::Skewed {
            warn!(
                record_id = record.id,
                user_id = record.user_id,
                "Check-out precedes check-in, reporting zero duration"
            );
        }
        let badge = classify_status(&record.status);

        AttendanceEntry {
            id: record.id,
            date: record.date,
            check_in_time: record.check_in_time,
            check_out_time: record.check_out_time,
            status: record.status.clone(),
            badge,
            label: badge.label().to_string(),
            icon: badge.icon().to_string(),
            time_range: format_time_range(
                record.check_in_time,
                record.check_out_time,
                &self.policy.offset,
            ),
            duration,
            duration_text: format_duration(&duration),
        }
    }

    pub async fn profile(&self, user_id: u64) -> Result<Profile, AppError> {
        Ok(self.profiles.find_profile(user_id).await?)
    }

    /// Records matching `query`, served from the read cache when possible.
    pub async fn records(&self, query: &RecordQuery) -> Result<Vec<AttendanceRecord>, AppError> {
        let key = self.cache.records_key(query);
        if let Some(records) = self.cache.records(&key).await {
            debug!(?query, "Attendance cache hit");
            return Ok(records);
        }
        let records = self.records.list_records(query).await?;
        self.cache.put_records(key, records.clone()).await;
        Ok(records)
    }

    pub async fn check_in(
        &self,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        let date = self.policy.local_date(now);
        let status = self.policy.status_for(now);

        let record = match self.records.find_record(user_id, date).await {
            Ok(existing) if existing.check_in_time.is_some() => {
                return Err(AppError::validation("Already checked in today"));
            }
            // A record without a check-in (e.g. pre-marked absent) is updated in place
            Ok(existing) => {
                match self.records.update_check_in(existing.id, now, status).await {
                    Ok(()) => {}
                    // Another check-in filled the record since it was read
                    Err(StoreError::Conflict) => {
                        return Err(AppError::validation("Already checked in today"));
                    }
                    Err(e) => return Err(e.into()),
                }
                AttendanceRecord {
                    check_in_time: Some(now),
                    status: status.as_ref().to_string(),
                    ..existing
                }
            }
            Err(StoreError::NotFound) => {
                let new = NewAttendance {
                    user_id,
                    date,
                    check_in_time: Some(now),
                    status,
                };
                match self.records.insert_record(new).await {
                    Ok(record) => record,
                    // Lost a race against another check-in for the same day
                    Err(StoreError::Conflict) => {
                        return Err(AppError::validation("Already checked in today"));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };

        self.cache.invalidate_records();
        info!(user_id, %date, status = record.status.as_str(), "Checked in");
        Ok(record)
    }

    pub async fn check_out(
        &self,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        let date = self.policy.local_date(now);

        let record = match self.records.find_record(user_id, date).await {
            Ok(record) => record,
            Err(StoreError::NotFound) => {
                return Err(AppError::validation("No active check-in found for today"));
            }
            Err(e) => return Err(e.into()),
        };

        let Some(check_in) = record.check_in_time else {
            return Err(AppError::validation("No active check-in found for today"));
        };
        if record.check_out_time.is_some() {
            return Err(AppError::validation("Already checked out today"));
        }

        let at = if now < check_in {
            warn!(user_id, %check_in, %now, "Clock skew on check-out, clamping to check-in time");
            check_in
        } else {
            now
        };

        match self.records.set_check_out(record.id, at).await {
            Ok(()) => {}
            Err(StoreError::Conflict) => {
                return Err(AppError::validation("Already checked out today"));
            }
            Err(e) => return Err(e.into()),
        }
        self.cache.invalidate_records();
        info!(user_id, %date, "Checked out");

        Ok(AttendanceRecord {
            check_out_time: Some(at),
            ..record
        })
    }

    pub async fn history(
        &self,
        user_id: u64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<HistoryView, AppError> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AppError::validation("from cannot be after to"));
            }
        }

        let records = self
            .records(&RecordQuery::for_user(user_id).between(from, to))
            .await?;
        let summary = summarize(&records);

        Ok(HistoryView {
            summary,
            attendance_rate_text: format_rate(summary.attendance_rate),
            records: records.iter().map(|r| self.entry(r)).collect(),
        })
    }

    /// Today's records for every user, newest check-in first, with staff details.
    pub async fn today_roster(&self, now: DateTime<Utc>) -> Result<TodayRoster, AppError> {
        let date = self.policy.local_date(now);
        let records = self.records(&RecordQuery::on_date(date)).await?;

        let ids: Vec<u64> = records
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let profiles = match self.profiles.list_profiles(&ids).await {
            Ok(profiles) => profiles,
            Err(e) => {
                warn!(error = %e, "Failed to load staff profiles for roster");
                Vec::new()
            }
        };

        let staff: HashSet<u64> = match cached_staff(self.profiles.as_ref(), &self.cache).await {
            Ok(staff) => staff.iter().map(|p| p.id).collect(),
            Err(e) => {
                // Absentees are unknown; count only staff who showed up today
                warn!(error = %e, "Failed to load staff list, overview limited to today's records");
                profiles
                    .iter()
                    .filter(|p| p.role == Role::Staff)
                    .map(|p| p.id)
                    .collect()
            }
        };

        let overview = daily_overview(date, &records, &staff);
        let entries = join_by_key(records, &profiles, |r| r.user_id, |p: &Profile| p.id)
            .into_iter()
            .map(|joined| RosterEntry {
                user_id: joined.row.user_id,
                name: joined.display_name(),
                staff_id: joined.staff_id(),
                department: joined.department(),
                attendance: self.entry(&joined.row),
            })
            .collect();

        Ok(TodayRoster {
            overview,
            attendance_rate_text: format_rate(overview.attendance_rate),
            entries,
        })
    }
}
