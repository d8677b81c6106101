use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use super::{ProfileDirectory, RecordStore};
use crate::error::StoreError;
use crate::model::attendance::{
    AttendanceRecord, AttendanceStatus, NewAttendance, RecordOrder, RecordQuery,
};
use crate::model::feedback::{FeedbackMessage, NewFeedbackMessage};
use crate::model::profile::Profile;
use crate::model::role::Role;

const RECORD_COLUMNS: &str = "id, user_id, date, check_in_time, check_out_time, status";
const MESSAGE_COLUMNS: &str = "id, admin_id, staff_id, subject, message, is_read, created_at";
const PROFILE_COLUMNS: &str = "id, staff_id, first_name, last_name, department, role";

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Date(NaiveDate),
}

#[derive(FromRow)]
struct ProfileRow {
    id: u64,
    staff_id: String,
    first_name: String,
    last_name: String,
    department: String,
    role: String,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            staff_id: row.staff_id,
            first_name: row.first_name,
            last_name: row.last_name,
            department: row.department,
            role: Role::from_name(&row.role),
        }
    }
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Why a guarded update touched no row: gone, or already set by someone else.
    async fn missed_update(&self, id: u64) -> StoreError {
        match self.fetch_record(id).await {
            Ok(_) => StoreError::Conflict,
            Err(e) => e,
        }
    }

    async fn fetch_record(&self, id: u64) -> Result<AttendanceRecord, StoreError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM attendance_records WHERE id = ?");
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }
}

#[async_trait]
impl RecordStore for MySqlStore {
    async fn find_record(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> Result<AttendanceRecord, StoreError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE user_id = ? AND date = ?"
        );
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list_records(&self, query: &RecordQuery) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(user_id) = query.user_id {
            where_sql.push_str(" AND user_id = ?");
            args.push(FilterValue::U64(user_id));
        }
        if let Some(from) = query.from {
            where_sql.push_str(" AND date >= ?");
            args.push(FilterValue::Date(from));
        }
        if let Some(to) = query.to {
            where_sql.push_str(" AND date <= ?");
            args.push(FilterValue::Date(to));
        }

        let order_sql = match query.order {
            RecordOrder::DateDesc => "date DESC, id DESC",
            RecordOrder::CheckInDesc => "check_in_time DESC, id DESC",
        };

        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records{where_sql} ORDER BY {order_sql}"
        );

        let mut q = sqlx::query_as::<_, AttendanceRecord>(&sql);
        for arg in args {
            q = match arg {
                FilterValue::U64(v) => q.bind(v),
                FilterValue::Date(d) => q.bind(d),
            };
        }

        Ok(q.fetch_all(&self.pool).await?)
    }

    async fn insert_record(&self, new: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records (user_id, date, check_in_time, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.date)
        .bind(new.check_in_time)
        .bind(new.status.as_ref())
        .execute(&self.pool)
        .await?;

        self.fetch_record(result.last_insert_id()).await
    }

    async fn update_check_in(
        &self,
        id: u64,
        at: DateTime<Utc>,
        status: AttendanceStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance_records
            SET check_in_time = ?, status = ?
            WHERE id = ? AND check_in_time IS NULL
            "#,
        )
        .bind(at)
        .bind(status.as_ref())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_update(id).await);
        }
        Ok(())
    }

    async fn set_check_out(&self, id: u64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance_records
            SET check_out_time = ?
            WHERE id = ? AND check_out_time IS NULL
            "#,
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.missed_update(id).await);
        }
        Ok(())
    }

    async fn insert_message(&self, new: NewFeedbackMessage) -> Result<FeedbackMessage, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO feedback_messages (admin_id, staff_id, subject, message, is_read, created_at)
            VALUES (?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(new.admin_id)
        .bind(new.staff_id)
        .bind(&new.subject)
        .bind(&new.message)
        .bind(new.created_at)
        .execute(&self.pool)
        .await?;

        Ok(FeedbackMessage {
            id: result.last_insert_id(),
            admin_id: new.admin_id,
            staff_id: new.staff_id,
            subject: new.subject,
            message: new.message,
            is_read: false,
            created_at: new.created_at,
        })
    }

    async fn list_messages(&self, staff_id: u64) -> Result<Vec<FeedbackMessage>, StoreError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM feedback_messages WHERE staff_id = ? ORDER BY created_at DESC, id DESC"
        );
        let messages = sqlx::query_as::<_, FeedbackMessage>(&sql)
            .bind(staff_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(messages)
    }

    async fn mark_message_read(&self, id: u64, staff_id: u64) -> Result<(), StoreError> {
        // Re-marking an already read message is a no-op, so existence is
        // checked separately from rows_affected.
        let found = sqlx::query_scalar::<_, u64>(
            "SELECT id FROM feedback_messages WHERE id = ? AND staff_id = ?",
        )
        .bind(id)
        .bind(staff_id)
        .fetch_optional(&self.pool)
        .await?;

        if found.is_none() {
            return Err(StoreError::NotFound);
        }

        sqlx::query("UPDATE feedback_messages SET is_read = TRUE WHERE id = ? AND staff_id = ?")
            .bind(id)
            .bind(staff_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for MySqlStore {
    async fn find_profile(&self, id: u64) -> Result<Profile, StoreError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn list_profiles(&self, ids: &[u64]) -> Result<Vec<Profile>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id IN ({placeholders})");

        let mut q = sqlx::query_as::<_, ProfileRow>(&sql);
        for id in ids {
            q = q.bind(*id);
        }

        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Profile>, StoreError> {
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = ? ORDER BY last_name, first_name"
        );
        let rows = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(role.as_ref())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }
}
