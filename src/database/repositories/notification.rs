use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::Notification;

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, message, read_at, created_at";

#[derive(Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i64,
        title: &str,
        message: &str,
    ) -> Result<Notification, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            INSERT INTO notifications (user_id, title, message, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(title)
        .bind(message)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn list_for_user(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let filter = if unread_only { "AND read_at IS NULL" } else { "" };
        sqlx::query_as::<_, Notification>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = ? {filter} ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Marks one of the user's notifications read. Already-read ones keep their timestamp.
    pub async fn mark_read(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Notification>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(&format!(
            r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, ?)
            WHERE id = ? AND user_id = ?
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
