use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::cached_staff;
use crate::auth::auth::AuthUser;
use crate::error::{AppError, StoreError};
use crate::model::feedback::{FeedbackMessage, NewFeedbackMessage};
use crate::model::profile::Profile;
use crate::model::role::Role;
use crate::store::{ProfileDirectory, RecordStore};
use crate::utils::join::join_by_key;
use crate::utils::read_cache::ReadCache;
use crate::view::format_sender;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendFeedback {
    #[schema(example = 1000)]
    pub staff_id: Option<u64>,
    #[schema(example = "Punctuality")]
    pub subject: String,
    #[schema(example = "Please remember to check in before 9:00.")]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InboxMessage {
    #[serde(flatten)]
    pub message: FeedbackMessage,
    #[schema(example = "Grace")]
    pub sender_first_name: String,
    #[schema(example = "Admin")]
    pub sender_last_name: String,
    #[schema(example = "From: Grace Admin")]
    pub sender: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Inbox {
    #[schema(example = 2)]
    pub unread_count: usize,
    pub messages: Vec<InboxMessage>,
}

#[derive(Clone)]
pub struct FeedbackService {
    records: Arc<dyn RecordStore>,
    profiles: Arc<dyn ProfileDirectory>,
    cache: ReadCache,
}

impl FeedbackService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        profiles: Arc<dyn ProfileDirectory>,
        cache: ReadCache,
    ) -> Self {
        Self {
            records,
            profiles,
            cache,
        }
    }

    pub async fn send(
        &self,
        sender: &AuthUser,
        payload: SendFeedback,
        now: DateTime<Utc>,
    ) -> Result<FeedbackMessage, AppError> {
        if !sender.is_admin() {
            return Err(AppError::forbidden("Admin only"));
        }

        let subject = payload.subject.trim();
        let message = payload.message.trim();
        let staff_id = match payload.staff_id {
            Some(id) if !subject.is_empty() && !message.is_empty() => id,
            _ => return Err(AppError::validation("All fields are required")),
        };

        match self.profiles.find_profile(staff_id).await {
            Ok(profile) if profile.role == Role::Staff => {}
            Ok(_) | Err(StoreError::NotFound) => {
                return Err(AppError::validation("Recipient is not a staff member"));
            }
            Err(e) => return Err(e.into()),
        }

        let sent = self
            .records
            .insert_message(NewFeedbackMessage {
                admin_id: sender.user_id,
                staff_id,
                subject: subject.to_string(),
                message: message.to_string(),
                created_at: now,
            })
            .await?;

        self.cache.invalidate_inboxes(staff_id);
        info!(message_id = sent.id, admin_id = sender.user_id, staff_id, "Feedback sent");
        Ok(sent)
    }

    async fn messages(&self, staff_id: u64) -> Result<Vec<FeedbackMessage>, AppError> {
        let key = self.cache.inbox_key(staff_id);
        if let Some(messages) = self.cache.inbox(&key).await {
            return Ok(messages);
        }
        let messages = self.records.list_messages(staff_id).await?;
        self.cache.put_inbox(key, messages.clone()).await;
        Ok(messages)
    }

    /// Messages for `staff_id`, newest first, with sender names attached.
    pub async fn inbox(&self, staff_id: u64) -> Result<Inbox, AppError> {
        let messages = self.messages(staff_id).await?;
        let unread_count = messages.iter().filter(|m| !m.is_read).count();

        let admin_ids: Vec<u64> = messages
            .iter()
            .map(|m| m.admin_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // Messages are still shown when sender profiles cannot be loaded
        let admins = match self.profiles.list_profiles(&admin_ids).await {
            Ok(admins) => admins,
            Err(e) => {
                warn!(error = %e, staff_id, "Failed to load sender profiles");
                Vec::new()
            }
        };

        let messages = join_by_key(messages, &admins, |m| m.admin_id, |p: &Profile| p.id)
            .into_iter()
            .map(|joined| {
                let first = joined.first_name_or("Unknown");
                let last = joined.last_name_or("Admin");
                InboxMessage {
                    sender: format_sender(&first, &last),
                    sender_first_name: first,
                    sender_last_name: last,
                    message: joined.row,
                }
            })
            .collect();

        Ok(Inbox {
            unread_count,
            messages,
        })
    }

    pub async fn unread_count(&self, staff_id: u64) -> Result<usize, AppError> {
        let messages = self.messages(staff_id).await?;
        Ok(messages.iter().filter(|m| !m.is_read).count())
    }

    /// Only the addressed staff member may mark a message as read.
    pub async fn mark_read(&self, staff_id: u64, message_id: u64) -> Result<(), AppError> {
        match self.records.mark_message_read(message_id, staff_id).await {
            Ok(()) => {}
            Err(StoreError::NotFound) => {
                return Err(AppError::NotFound("Message not found".to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        self.cache.invalidate_inboxes(staff_id);
        Ok(())
    }

    pub async fn staff_members(&self) -> Result<Vec<Profile>, AppError> {
        Ok(cached_staff(self.profiles.as_ref(), &self.cache).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{ADMIN_ID, OTHER_STAFF_ID, STAFF_ID, local, services};
    use super::*;

    fn admin() -> AuthUser {
        AuthUser {
            user_id: ADMIN_ID,
            role: Role::Admin,
        }
    }

    fn payload(staff_id: Option<u64>, subject: &str, message: &str) -> SendFeedback {
        SendFeedback {
            staff_id,
            subject: subject.to_string(),
            message: message.to_string(),
        }
    }

    #[actix_web::test]
    async fn admin_sends_trimmed_message() {
        let (_, feedback, _) = services();
        let sent = feedback
            .send(&admin(), payload(Some(STAFF_ID), "  Punctuality ", " Be on time. "), local(10, 0))
            .await
            .unwrap();
        assert_eq!(sent.subject, "Punctuality");
        assert_eq!(sent.message, "Be on time.");
        assert!(!sent.is_read);
    }

    #[actix_web::test]
    async fn staff_cannot_send() {
        let (_, feedback, _) = services();
        let staff = AuthUser {
            user_id: STAFF_ID,
            role: Role::Staff,
        };
        let err = feedback
            .send(&staff, payload(Some(OTHER_STAFF_ID), "Hi", "Hello"), local(10, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[actix_web::test]
    async fn blank_fields_are_rejected() {
        let (_, feedback, _) = services();
        for p in [
            payload(None, "Hi", "Hello"),
            payload(Some(STAFF_ID), "   ", "Hello"),
            payload(Some(STAFF_ID), "Hi", ""),
        ] {
            let err = feedback.send(&admin(), p, local(10, 0)).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m == "All fields are required"));
        }
    }

    #[actix_web::test]
    async fn recipient_must_be_staff() {
        let (_, feedback, _) = services();
        for id in [ADMIN_ID, 9999] {
            let err = feedback
                .send(&admin(), payload(Some(id), "Hi", "Hello"), local(10, 0))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[actix_web::test]
    async fn inbox_is_newest_first_with_sender_names() {
        let (_, feedback, _) = services();
        feedback
            .send(&admin(), payload(Some(STAFF_ID), "First", "one"), local(9, 0))
            .await
            .unwrap();
        feedback
            .send(&admin(), payload(Some(STAFF_ID), "Second", "two"), local(11, 0))
            .await
            .unwrap();

        let inbox = feedback.inbox(STAFF_ID).await.unwrap();
        assert_eq!(inbox.unread_count, 2);
        let subjects: Vec<_> = inbox.messages.iter().map(|m| m.message.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Second", "First"]);
        assert_eq!(inbox.messages[0].sender, "From: Grace Admin");

        assert_eq!(feedback.inbox(OTHER_STAFF_ID).await.unwrap().messages.len(), 0);
    }

    #[actix_web::test]
    async fn unknown_sender_gets_default_name() {
        let (_, feedback, store) = services();
        store
            .insert_message(NewFeedbackMessage {
                admin_id: 77,
                staff_id: STAFF_ID,
                subject: "Orphan".into(),
                message: "from a deleted admin".into(),
                created_at: local(8, 0),
            })
            .await
            .unwrap();

        let inbox = feedback.inbox(STAFF_ID).await.unwrap();
        assert_eq!(inbox.messages[0].sender, "From: Unknown Admin");
    }

    #[actix_web::test]
    async fn mark_read_updates_inbox() {
        let (_, feedback, _) = services();
        let sent = feedback
            .send(&admin(), payload(Some(STAFF_ID), "Hi", "Hello"), local(9, 0))
            .await
            .unwrap();

        // Prime the cache, then make sure the write shows through
        assert_eq!(feedback.unread_count(STAFF_ID).await.unwrap(), 1);

        let err = feedback.mark_read(OTHER_STAFF_ID, sent.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        feedback.mark_read(STAFF_ID, sent.id).await.unwrap();
        assert_eq!(feedback.unread_count(STAFF_ID).await.unwrap(), 0);
        assert!(feedback.inbox(STAFF_ID).await.unwrap().messages[0].message.is_read);
    }

    #[actix_web::test]
    async fn staff_members_excludes_admins() {
        let (_, feedback, _) = services();
        let staff = feedback.staff_members().await.unwrap();
        let names: Vec<_> = staff.iter().map(Profile::full_name).collect();
        assert_eq!(names, vec!["John Doe", "Jane Roe"]);
    }
}
