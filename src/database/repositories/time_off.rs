use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::database::models::{TimeOffQuery, TimeOffRequest, TimeOffRequestInput, TimeOffStatus};

const TIME_OFF_COLUMNS: &str = "id, user_id, start_date, end_date, request_type, reason, status, reviewed_by, review_notes, created_at, updated_at";

#[derive(Clone)]
pub struct TimeOffRepository {
    pool: SqlitePool,
}

impl TimeOffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_request(
        &self,
        user_id: i64,
        input: &TimeOffRequestInput,
    ) -> Result<TimeOffRequest, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            INSERT INTO time_off_requests (user_id, start_date, end_date, request_type, reason, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {TIME_OFF_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.request_type)
        .bind(&input.reason)
        .bind(TimeOffStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<TimeOffRequest>, sqlx::Error> {
        sqlx::query_as::<_, TimeOffRequest>(&format!(
            "SELECT {TIME_OFF_COLUMNS} FROM time_off_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_query(
        &self,
        query: &TimeOffQuery,
    ) -> Result<Vec<TimeOffRequest>, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {TIME_OFF_COLUMNS} FROM time_off_requests WHERE 1 = 1"
        ));

        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status);
        }
        if let Some(user_id) = query.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        builder.push(" ORDER BY start_date DESC, id DESC");

        builder
            .build_query_as::<TimeOffRequest>()
            .fetch_all(&self.pool)
            .await
    }

    /// Moves a request out of `pending`. Returns None when it was not pending.
    pub async fn resolve_pending(
        &self,
        id: i64,
        status: TimeOffStatus,
        reviewed_by: Option<&str>,
        review_notes: Option<&str>,
    ) -> Result<Option<TimeOffRequest>, sqlx::Error> {
        sqlx::query_as::<_, TimeOffRequest>(&format!(
            r#"
            UPDATE time_off_requests
            SET status = ?, reviewed_by = ?, review_notes = ?, updated_at = ?
            WHERE id = ? AND status = ?
            RETURNING {TIME_OFF_COLUMNS}
            "#
        ))
        .bind(status)
        .bind(reviewed_by)
        .bind(review_notes)
        .bind(Utc::now())
        .bind(id)
        .bind(TimeOffStatus::Pending)
        .fetch_optional(&self.pool)
        .await
    }
}
