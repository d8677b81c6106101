pub mod attendance;
pub mod dashboard;
pub mod feedback;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

use crate::error::StoreError;
use crate::model::attendance::AttendanceStatus;
use crate::model::profile::Profile;
use crate::model::role::Role;
use crate::store::ProfileDirectory;
use crate::utils::read_cache::ReadCache;

pub use attendance::AttendanceService;
pub use feedback::FeedbackService;

/// When a workday starts and which check-ins count as late.
#[derive(Debug, Copy, Clone)]
pub struct CheckInPolicy {
    pub late_after: NaiveTime,
    pub offset: FixedOffset,
}

impl CheckInPolicy {
    pub fn new(late_after: NaiveTime, offset: FixedOffset) -> Self {
        Self { late_after, offset }
    }

    /// Calendar day of `now` in the workday's timezone.
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    pub fn status_for(&self, check_in: DateTime<Utc>) -> AttendanceStatus {
        if check_in.with_timezone(&self.offset).time() > self.late_after {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }
}

/// Staff profiles through the read cache.
pub(crate) async fn cached_staff(
    profiles: &dyn ProfileDirectory,
    cache: &ReadCache,
) -> Result<Vec<Profile>, StoreError> {
    if let Some(staff) = cache.staff().await {
        return Ok(staff);
    }
    let staff = profiles.list_by_role(Role::Staff).await?;
    cache.put_staff(staff.clone()).await;
    Ok(staff)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Utc};

    use super::{AttendanceService, CheckInPolicy, FeedbackService};
    use crate::model::profile::Profile;
    use crate::model::role::Role;
    use crate::store::MemoryStore;
    use crate::utils::read_cache::ReadCache;

    pub const ADMIN_ID: u64 = 1;
    pub const STAFF_ID: u64 = 1000;
    pub const OTHER_STAFF_ID: u64 = 1001;

    pub fn profile(id: u64, first: &str, last: &str, role: Role) -> Profile {
        Profile {
            id,
            staff_id: format!("ICP/2024/{id:03}"),
            first_name: first.to_string(),
            last_name: last.to_string(),
            department: "Computer Science".to_string(),
            role,
        }
    }

    pub fn policy() -> CheckInPolicy {
        CheckInPolicy::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            FixedOffset::east_opt(3600).unwrap(),
        )
    }

    /// Wall-clock time in UTC+1 on 2024-01-15 (a Monday).
    pub fn local(h: u32, m: u32) -> DateTime<Utc> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    pub fn services() -> (AttendanceService, FeedbackService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_profiles(vec![
            profile(ADMIN_ID, "Grace", "Admin", Role::Admin),
            profile(STAFF_ID, "John", "Doe", Role::Staff),
            profile(OTHER_STAFF_ID, "Jane", "Roe", Role::Staff),
        ]));
        let cache = ReadCache::new(Duration::from_secs(60));
        let attendance =
            AttendanceService::new(store.clone(), store.clone(), cache.clone(), policy());
        let feedback = FeedbackService::new(store.clone(), store.clone(), cache);
        (attendance, feedback, store)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{local, policy};
    use super::*;

    #[test]
    fn late_only_after_cutoff() {
        let p = policy();
        assert_eq!(p.status_for(local(8, 59)), AttendanceStatus::Present);
        assert_eq!(p.status_for(local(9, 0)), AttendanceStatus::Present);
        assert_eq!(p.status_for(local(9, 1)), AttendanceStatus::Late);
    }

    #[test]
    fn local_date_follows_offset() {
        let p = policy();
        // 23:30 UTC on the 14th is 00:30 on the 15th in UTC+1
        assert_eq!(
            p.local_date(local(0, 30)),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }
}
