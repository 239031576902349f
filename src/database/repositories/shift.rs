use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::database::models::{CloseShiftInput, OpenShiftInput, Shift, ShiftQuery, UpdateShiftInput};

const SHIFT_COLUMNS: &str = "id, user_id, location_id, clock_in, clock_out, clock_in_lat, clock_in_lng, clock_out_lat, clock_out_lng, is_adhoc, notes, created_at, updated_at";

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 500;

#[derive(Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // The three calls below run inside the clock transaction.

    pub async fn find_open_for_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> Result<Option<Shift>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE user_id = ? AND clock_out IS NULL ORDER BY clock_in DESC LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(conn)
        .await
    }

    pub async fn open_shift(
        conn: &mut SqliteConnection,
        input: &OpenShiftInput,
    ) -> Result<Shift, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            INSERT INTO shifts (user_id, location_id, clock_in, clock_in_lat, clock_in_lng, is_adhoc, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(input.user_id)
        .bind(input.location_id)
        .bind(input.clock_in)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.is_adhoc)
        .bind(&input.notes)
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await
    }

    /// Closes an open shift. The original location is kept; the matched one only
    /// fills in when the shift started without one, which also clears `is_adhoc`.
    pub async fn close_shift(
        conn: &mut SqliteConnection,
        shift_id: i64,
        input: &CloseShiftInput,
    ) -> Result<Option<Shift>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET clock_out = ?,
                clock_out_lat = ?,
                clock_out_lng = ?,
                location_id = COALESCE(location_id, ?),
                is_adhoc = CASE WHEN location_id IS NULL AND ? IS NOT NULL THEN 0 ELSE is_adhoc END,
                notes = COALESCE(?, notes),
                updated_at = ?
            WHERE id = ? AND clock_out IS NULL
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(input.clock_out)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.location_id)
        .bind(input.location_id)
        .bind(&input.notes)
        .bind(Utc::now())
        .bind(shift_id)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Shift>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_open_shift(&self, user_id: i64) -> Result<Option<Shift>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        Self::find_open_for_user(&mut conn, user_id).await
    }

    pub async fn find_by_query(&self, query: &ShiftQuery) -> Result<Vec<Shift>, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE 1 = 1"));

        if let Some(user_id) = query.user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(location_id) = query.location_id {
            builder.push(" AND location_id = ").push_bind(location_id);
        }
        if query.open_only {
            builder.push(" AND clock_out IS NULL");
        }
        if let Some(from) = query.from {
            builder.push(" AND clock_in >= ").push_bind(from);
        }
        if let Some(to) = query.to {
            builder.push(" AND clock_in < ").push_bind(to);
        }

        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0).max(0);

        builder
            .push(" ORDER BY clock_in DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        builder
            .build_query_as::<Shift>()
            .fetch_all(&self.pool)
            .await
    }

    pub async fn update_shift(
        &self,
        id: i64,
        input: &UpdateShiftInput,
    ) -> Result<Option<Shift>, sqlx::Error> {
        sqlx::query_as::<_, Shift>(&format!(
            r#"
            UPDATE shifts
            SET clock_in = COALESCE(?, clock_in),
                clock_out = COALESCE(?, clock_out),
                location_id = COALESCE(?, location_id),
                is_adhoc = CASE WHEN ? IS NOT NULL THEN 0 ELSE is_adhoc END,
                notes = COALESCE(?, notes),
                updated_at = ?
            WHERE id = ?
            RETURNING {SHIFT_COLUMNS}
            "#
        ))
        .bind(input.clock_in)
        .bind(input.clock_out)
        .bind(input.location_id)
        .bind(input.location_id)
        .bind(&input.notes)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete_shift(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM shifts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
