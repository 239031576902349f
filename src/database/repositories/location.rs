use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::{Location, LocationInput, UpdateLocationInput};

const LOCATION_COLUMNS: &str =
    "id, name, code, latitude, longitude, radius_meters, active, created_at, updated_at";

#[derive(Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_location(&self, input: &LocationInput) -> Result<Location, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Location>(&format!(
            r#"
            INSERT INTO locations (name, code, latitude, longitude, radius_meters, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.radius_meters)
        .bind(input.active.unwrap_or(true))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Location>, sqlx::Error> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_locations(&self, include_inactive: bool) -> Result<Vec<Location>, sqlx::Error> {
        let filter = if include_inactive { "" } else { "WHERE active = 1" };
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations {filter} ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Active locations in id order; the order decides geofence ties.
    pub async fn list_active_for_matching(&self) -> Result<Vec<Location>, sqlx::Error> {
        sqlx::query_as::<_, Location>(&format!(
            "SELECT {LOCATION_COLUMNS} FROM locations WHERE active = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn update_location(
        &self,
        id: i64,
        input: &UpdateLocationInput,
    ) -> Result<Option<Location>, sqlx::Error> {
        sqlx::query_as::<_, Location>(&format!(
            r#"
            UPDATE locations
            SET name = COALESCE(?, name),
                code = COALESCE(?, code),
                latitude = COALESCE(?, latitude),
                longitude = COALESCE(?, longitude),
                radius_meters = COALESCE(?, radius_meters),
                active = COALESCE(?, active),
                updated_at = ?
            WHERE id = ?
            RETURNING {LOCATION_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(input.radius_meters)
        .bind(input.active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn deactivate_location(&self, id: i64) -> Result<Option<Location>, sqlx::Error> {
        sqlx::query_as::<_, Location>(&format!(
            "UPDATE locations SET active = 0, updated_at = ? WHERE id = ? RETURNING {LOCATION_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
