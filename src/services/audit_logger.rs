use std::collections::HashMap;

use crate::database::models::{AuditLog, CreateAuditLogInput};
use crate::database::repositories::AuditRepository;
use crate::middleware::RequestInfo;

#[derive(Clone)]
pub struct AuditLogger {
    repository: AuditRepository,
}

/// Builds audit metadata from string pairs.
pub fn metadata(pairs: Vec<(&str, String)>) -> HashMap<String, serde_json::Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v)))
        .collect()
}

impl AuditLogger {
    pub fn new(repository: AuditRepository) -> Self {
        Self { repository }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn log(
        &self,
        actor: String,
        action: &str,
        entity_type: &str,
        entity_id: Option<i64>,
        description: String,
        metadata: Option<HashMap<String, serde_json::Value>>,
        req_info: &RequestInfo,
    ) -> Result<AuditLog, sqlx::Error> {
        self.repository
            .log(CreateAuditLogInput {
                actor,
                action: action.to_string(),
                entity_type: entity_type.to_string(),
                entity_id,
                description,
                metadata,
                ip_address: Some(req_info.ip_address.clone()),
                user_agent: Some(req_info.user_agent.clone()),
                correlation_id: req_info.correlation_id.clone(),
            })
            .await
    }
}
