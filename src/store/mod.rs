//! Persistence contracts.
//!
//! Attendance records and feedback messages live behind [`RecordStore`];
//! staff profiles, owned by the identity side, behind [`ProfileDirectory`].
//! Both are implemented over MySQL and in memory.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::StoreError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance, RecordQuery};
use crate::model::feedback::{FeedbackMessage, NewFeedbackMessage};
use crate::model::profile::Profile;
use crate::model::role::Role;

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The record for `(user_id, date)`, or `StoreError::NotFound`.
    async fn find_record(&self, user_id: u64, date: NaiveDate)
    -> Result<AttendanceRecord, StoreError>;

    async fn list_records(&self, query: &RecordQuery) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Fails with `StoreError::Conflict` when the user already has a record that day.
    async fn insert_record(&self, new: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    /// Only fills an empty check-in; `StoreError::Conflict` if one is already set.
    async fn update_check_in(
        &self,
        id: u64,
        at: DateTime<Utc>,
        status: AttendanceStatus,
    ) -> Result<(), StoreError>;

    /// Only fills an empty check-out; `StoreError::Conflict` if one is already set.
    async fn set_check_out(&self, id: u64, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn insert_message(&self, new: NewFeedbackMessage) -> Result<FeedbackMessage, StoreError>;

    /// Messages addressed to `staff_id`, newest first.
    async fn list_messages(&self, staff_id: u64) -> Result<Vec<FeedbackMessage>, StoreError>;

    /// Only matches a message addressed to `staff_id`.
    async fn mark_message_read(&self, id: u64, staff_id: u64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn find_profile(&self, id: u64) -> Result<Profile, StoreError>;

    async fn list_profiles(&self, ids: &[u64]) -> Result<Vec<Profile>, StoreError>;

    async fn list_by_role(&self, role: Role) -> Result<Vec<Profile>, StoreError>;
}
