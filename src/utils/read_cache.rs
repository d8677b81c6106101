use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;

use crate::model::attendance::{AttendanceRecord, RecordQuery};
use crate::model::feedback::FeedbackMessage;
use crate::model::profile::Profile;

/// Cache key of an attendance list, stamped with the epoch it was read in.
pub type RecordKey = (u64, RecordQuery);

/// Cache key of an inbox, stamped with the epoch it was read in.
pub type InboxKey = (u64, u64);

/// Cached reads shared by the services.
///
/// Keys carry the write epoch current when the read *started*: callers take a
/// key, read the store, then store the result under that same key. A write
/// landing in between bumps the epoch, so the stale result is filed under an
/// epoch nobody asks for again and ages out through the TTL.
///
/// Attendance lists share one epoch. Inboxes share another, bumped by any
/// message write.
#[derive(Clone)]
pub struct ReadCache {
    records_epoch: Arc<AtomicU64>,
    inbox_epoch: Arc<AtomicU64>,
    records: Cache<RecordKey, Vec<AttendanceRecord>>,
    inboxes: Cache<InboxKey, Vec<FeedbackMessage>>,
    staff: Cache<(), Vec<Profile>>,
}

impl ReadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            records_epoch: Arc::new(AtomicU64::new(0)),
            inbox_epoch: Arc::new(AtomicU64::new(0)),
            records: Cache::builder()
                .max_capacity(10_000) // tune based on memory
                .time_to_live(ttl)
                .build(),
            inboxes: Cache::builder().max_capacity(10_000).time_to_live(ttl).build(),
            staff: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Take before reading the store.
    pub fn records_key(&self, query: &RecordQuery) -> RecordKey {
        (self.records_epoch.load(Ordering::Acquire), query.clone())
    }

    pub async fn records(&self, key: &RecordKey) -> Option<Vec<AttendanceRecord>> {
        self.records.get(key).await
    }

    pub async fn put_records(&self, key: RecordKey, records: Vec<AttendanceRecord>) {
        self.records.insert(key, records).await;
    }

    pub fn invalidate_records(&self) {
        let epoch = self.records_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("Attendance read cache invalidated (epoch {})", epoch);
    }

    /// Take before reading the store.
    pub fn inbox_key(&self, staff_id: u64) -> InboxKey {
        (self.inbox_epoch.load(Ordering::Acquire), staff_id)
    }

    pub async fn inbox(&self, key: &InboxKey) -> Option<Vec<FeedbackMessage>> {
        self.inboxes.get(key).await
    }

    pub async fn put_inbox(&self, key: InboxKey, messages: Vec<FeedbackMessage>) {
        self.inboxes.insert(key, messages).await;
    }

    pub fn invalidate_inboxes(&self, staff_id: u64) {
        let epoch = self.inbox_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        log::debug!("Inbox cache invalidated after write for staff {} (epoch {})", staff_id, epoch);
    }

    pub async fn staff(&self) -> Option<Vec<Profile>> {
        self.staff.get(&()).await
    }

    pub async fn put_staff(&self, profiles: Vec<Profile>) {
        self.staff.insert((), profiles).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn write_invalidates_record_lists() {
        let cache = ReadCache::new(Duration::from_secs(60));
        let query = RecordQuery::for_user(1);

        let key = cache.records_key(&query);
        cache.put_records(key.clone(), Vec::new()).await;
        assert!(cache.records(&key).await.is_some());

        cache.invalidate_records();
        assert!(cache.records(&cache.records_key(&query)).await.is_none());
    }

    #[actix_web::test]
    async fn result_read_before_a_write_is_never_served_after_it() {
        let cache = ReadCache::new(Duration::from_secs(60));
        let query = RecordQuery::for_user(1);

        // Read starts, a write lands, then the stale result is stored
        let key = cache.records_key(&query);
        cache.invalidate_records();
        cache.put_records(key, Vec::new()).await;
        assert!(cache.records(&cache.records_key(&query)).await.is_none());

        let key = cache.inbox_key(7);
        cache.invalidate_inboxes(7);
        cache.put_inbox(key, Vec::new()).await;
        assert!(cache.inbox(&cache.inbox_key(7)).await.is_none());
    }

    #[actix_web::test]
    async fn inbox_write_invalidates_cached_inboxes() {
        let cache = ReadCache::new(Duration::from_secs(60));
        cache.put_inbox(cache.inbox_key(1), Vec::new()).await;
        assert!(cache.inbox(&cache.inbox_key(1)).await.is_some());

        cache.invalidate_inboxes(1);
        assert!(cache.inbox(&cache.inbox_key(1)).await.is_none());
    }
}
