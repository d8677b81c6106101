use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::{ProfileDirectory, RecordStore};
use crate::error::StoreError;
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, NewAttendance, RecordOrder, RecordQuery,
};
use crate::model::feedback::{FeedbackMessage, NewFeedbackMessage};
use crate::model::profile::Profile;
use crate::model::role::Role;

#[derive(Default)]
struct Tables {
    records: Vec<AttendanceRecord>,
    messages: Vec<FeedbackMessage>,
    profiles: Vec<Profile>,
    next_record_id: u64,
    next_message_id: u64,
}

/// Process-local store used when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        let store = Self::default();
        if let Ok(mut t) = store.tables.write() {
            t.profiles = profiles;
        }
        store
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".to_string()))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_record(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<AttendanceRecord, StoreError> {
        self.read()?
            .records
            .iter()
            .find(|r| r.user_id == user_id && r.date == date)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_records(&self, query: &RecordQuery) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut records: Vec<AttendanceRecord> = self
            .read()?
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();

        match query.order {
            RecordOrder::DateDesc => {
                records.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)))
            }
            RecordOrder::CheckInDesc => records.sort_by(|a, b| {
                b.check_in_time
                    .cmp(&a.check_in_time)
                    .then(b.id.cmp(&a.id))
            }),
        }
        Ok(records)
    }

    async fn insert_record(&self, new: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let mut t = self.write()?;
        if t.records
            .iter()
            .any(|r| r.user_id == new.user_id && r.date == new.date)
        {
            return Err(StoreError::Conflict);
        }

        t.next_record_id += 1;
        let record = AttendanceRecord {
            id: t.next_record_id,
            user_id: new.user_id,
            date: new.date,
            check_in_time: new.check_in_time,
            check_out_time: None,
            status: new.status.as_ref().to_string(),
        };
        t.records.push(record.clone());
        Ok(record)
    }

    async fn update_check_in(
        &self,
        id: u64,
        at: DateTime<Utc>,
        status: AttendanceStatus,
    ) -> Result<(), StoreError> {
        let mut t = self.write()?;
        let record = t
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        if record.check_in_time.is_some() {
            return Err(StoreError::Conflict);
        }
        record.check_in_time = Some(at);
        record.status = status.as_ref().to_string();
        Ok(())
    }

    async fn set_check_out(&self, id: u64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut t = self.write()?;
        let record = t
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        if record.check_out_time.is_some() {
            return Err(StoreError::Conflict);
        }
        record.check_out_time = Some(at);
        Ok(())
    }

    async fn insert_message(&self, new: NewFeedbackMessage) -> Result<FeedbackMessage, StoreError> {
        let mut t = self.write()?;
        t.next_message_id += 1;
        let message = FeedbackMessage {
            id: t.next_message_id,
            admin_id: new.admin_id,
            staff_id: new.staff_id,
            subject: new.subject,
            message: new.message,
            is_read: false,
            created_at: new.created_at,
        };
        t.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self, staff_id: u64) -> Result<Vec<FeedbackMessage>, StoreError> {
        let mut messages: Vec<FeedbackMessage> = self
            .read()?
            .messages
            .iter()
            .filter(|m| m.staff_id == staff_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(messages)
    }

    async fn mark_message_read(&self, id: u64, staff_id: u64) -> Result<(), StoreError> {
        let mut t = self.write()?;
        let message = t
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.staff_id == staff_id)
            .ok_or(StoreError::NotFound)?;
        message.is_read = true;
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for MemoryStore {
    async fn find_profile(&self, id: u64) -> Result<Profile, StoreError> {
        self.read()?
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_profiles(&self, ids: &[u64]) -> Result<Vec<Profile>, StoreError> {
        Ok(self
            .read()?
            .profiles
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Profile>, StoreError> {
        let mut profiles: Vec<Profile> = self
            .read()?
            .profiles
            .iter()
            .filter(|p| p.role == role)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then(a.first_name.cmp(&b.first_name))
        });
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn new_record(user_id: u64, date: NaiveDate, hour: u32) -> NewAttendance {
        NewAttendance {
            user_id,
            date,
            check_in_time: Some(date.and_hms_opt(hour, 0, 0).unwrap().and_utc()),
            status: AttendanceStatus::Present,
        }
    }

    #[actix_web::test]
    async fn one_record_per_user_and_day() {
        let store = MemoryStore::new();
        store.insert_record(new_record(1, day(15), 9)).await.unwrap();

        let dup = store.insert_record(new_record(1, day(15), 10)).await;
        assert_eq!(dup.unwrap_err(), StoreError::Conflict);

        store.insert_record(new_record(2, day(15), 10)).await.unwrap();
        store.insert_record(new_record(1, day(16), 9)).await.unwrap();
    }

    #[actix_web::test]
    async fn timestamps_are_set_once() {
        let store = MemoryStore::new();
        let record = store.insert_record(new_record(1, day(15), 9)).await.unwrap();
        let at = day(15).and_hms_opt(17, 0, 0).unwrap().and_utc();

        store.set_check_out(record.id, at).await.unwrap();
        let later = day(15).and_hms_opt(18, 0, 0).unwrap().and_utc();
        assert_eq!(
            store.set_check_out(record.id, later).await.unwrap_err(),
            StoreError::Conflict
        );
        assert_eq!(
            store.update_check_in(record.id, later, AttendanceStatus::Late).await.unwrap_err(),
            StoreError::Conflict
        );

        let stored = store.find_record(1, day(15)).await.unwrap();
        assert_eq!(stored.check_out_time, Some(at));
        assert_eq!(stored.status, "present");

        assert_eq!(store.set_check_out(999, at).await.unwrap_err(), StoreError::NotFound);
    }

    #[actix_web::test]
    async fn find_reports_not_found() {
        let store = MemoryStore::new();
        assert_eq!(store.find_record(1, day(15)).await.unwrap_err(), StoreError::NotFound);
    }

    #[actix_web::test]
    async fn list_filters_and_orders() {
        let store = MemoryStore::new();
        store.insert_record(new_record(1, day(14), 9)).await.unwrap();
        store.insert_record(new_record(1, day(16), 9)).await.unwrap();
        store.insert_record(new_record(1, day(15), 9)).await.unwrap();
        store.insert_record(new_record(2, day(15), 8)).await.unwrap();

        let mine = store
            .list_records(&RecordQuery::for_user(1).between(Some(day(15)), None))
            .await
            .unwrap();
        let dates: Vec<_> = mine.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(16), day(15)]);

        let today = store.list_records(&RecordQuery::on_date(day(15))).await.unwrap();
        let users: Vec<_> = today.iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![1, 2]);
    }

    #[actix_web::test]
    async fn mark_read_is_scoped_to_recipient() {
        let store = MemoryStore::new();
        let msg = store
            .insert_message(NewFeedbackMessage {
                admin_id: 1,
                staff_id: 2,
                subject: "Hi".into(),
                message: "Hello".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert_eq!(store.mark_message_read(msg.id, 3).await.unwrap_err(), StoreError::NotFound);
        store.mark_message_read(msg.id, 2).await.unwrap();
        assert!(store.list_messages(2).await.unwrap()[0].is_read);
    }
}
