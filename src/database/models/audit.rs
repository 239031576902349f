use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    /// `admin` or `user:<id>`.
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub description: String,
    pub metadata: Option<String>, // JSON text
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub correlation_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateAuditLogInput {
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub description: String,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub correlation_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[allow(non_snake_case)]
pub mod EntityType {
    pub const USER: &str = "user";
    pub const SHIFT: &str = "shift";
    pub const LOCATION: &str = "location";
    pub const TIME_OFF: &str = "time_off";
    pub const SESSION: &str = "session";
}

#[allow(non_snake_case)]
pub mod Action {
    pub const CREATED: &str = "created";
    pub const UPDATED: &str = "updated";
    pub const DELETED: &str = "deleted";
    pub const DEACTIVATED: &str = "deactivated";
    pub const CLOCK_IN: &str = "clock_in";
    pub const CLOCK_OUT: &str = "clock_out";
    pub const APPROVED: &str = "approved";
    pub const DENIED: &str = "denied";
    pub const LOGIN: &str = "login";
}
