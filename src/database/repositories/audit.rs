use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::database::models::{AuditLog, AuditLogQuery, CreateAuditLogInput};

const AUDIT_COLUMNS: &str = "id, actor, action, entity_type, entity_id, description, metadata, ip_address, user_agent, correlation_id, created_at";

#[derive(Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn log(&self, input: CreateAuditLogInput) -> Result<AuditLog, sqlx::Error> {
        let metadata = input
            .metadata
            .as_ref()
            .and_then(|m| serde_json::to_string(m).ok());

        sqlx::query_as::<_, AuditLog>(&format!(
            r#"
            INSERT INTO audit_logs (actor, action, entity_type, entity_id, description, metadata, ip_address, user_agent, correlation_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {AUDIT_COLUMNS}
            "#
        ))
        .bind(&input.actor)
        .bind(&input.action)
        .bind(&input.entity_type)
        .bind(input.entity_id)
        .bind(&input.description)
        .bind(metadata)
        .bind(&input.ip_address)
        .bind(&input.user_agent)
        .bind(&input.correlation_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_query(&self, query: &AuditLogQuery) -> Result<Vec<AuditLog>, sqlx::Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {AUDIT_COLUMNS} FROM audit_logs WHERE 1 = 1"));

        if let Some(entity_type) = &query.entity_type {
            builder.push(" AND entity_type = ").push_bind(entity_type.clone());
        }
        if let Some(entity_id) = query.entity_id {
            builder.push(" AND entity_id = ").push_bind(entity_id);
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(query.limit.unwrap_or(50).clamp(1, 500))
            .push(" OFFSET ")
            .push_bind(query.offset.unwrap_or(0).max(0));

        builder
            .build_query_as::<AuditLog>()
            .fetch_all(&self.pool)
            .await
    }
}
