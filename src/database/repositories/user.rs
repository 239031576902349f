use chrono::Utc;
use sqlx::SqlitePool;

use crate::database::models::{NewUser, UpdateEmployeeInput, User};

const USER_COLUMNS: &str = "id, employee_code, name, email, pin_hash, role, active, hourly_rate, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (employee_code, name, email, pin_hash, role, active, hourly_rate, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.employee_code)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.pin_hash)
        .bind(user.role)
        .bind(user.active)
        .bind(user.hourly_rate)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_employee_code(
        &self,
        employee_code: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE employee_code = ?"
        ))
        .bind(employee_code)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_users(&self, active: Option<bool>) -> Result<Vec<User>, sqlx::Error> {
        let users = match active {
            Some(active) => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE active = ? ORDER BY name, id"
                ))
                .bind(active)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY name, id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(users)
    }

    /// Applies the present fields; `pin_hash` replaces the stored hash when given.
    pub async fn update_user(
        &self,
        id: i64,
        input: &UpdateEmployeeInput,
        pin_hash: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE(?, name),
                email = COALESCE(?, email),
                pin_hash = COALESCE(?, pin_hash),
                role = COALESCE(?, role),
                active = COALESCE(?, active),
                hourly_rate = COALESCE(?, hourly_rate),
                updated_at = ?
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(pin_hash)
        .bind(input.role)
        .bind(input.active)
        .bind(input.hourly_rate)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn deactivate_user(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET active = 0, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn employee_code_exists(&self, employee_code: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE employee_code = ?")
            .bind(employee_code)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }
}
