use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct FeedbackMessage {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub admin_id: u64,
    #[schema(example = 1000)]
    pub staff_id: u64,
    #[schema(example = "Punctuality")]
    pub subject: String,
    #[schema(example = "Please remember to check in before 9:00.")]
    pub message: String,
    pub is_read: bool,
    #[schema(example = "2024-01-15T10:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeedbackMessage {
    pub admin_id: u64,
    pub staff_id: u64,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
