use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub employee_code: String,
    pub name: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub pin_hash: String,
    pub role: UserRole,
    pub active: bool,
    pub hourly_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum UserRole {
        Admin => "admin",
        #[default]
        Worker => "worker",
    }
}

/// Fields for a new employee row. The PIN is already hashed at this point.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub employee_code: String,
    pub name: String,
    pub email: Option<String>,
    pub pin_hash: String,
    pub role: UserRole,
    pub active: bool,
    pub hourly_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeInput {
    pub employee_code: String,
    pub name: String,
    pub email: Option<String>,
    /// Generated when omitted.
    pub pin: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
    pub hourly_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub pin: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
    pub hourly_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWorkerInput {
    pub employee_code: String,
    pub name: String,
    pub email: Option<String>,
    pub pin: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeQuery {
    pub active: Option<bool>,
}

/// Returned once, when the server generated the PIN.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEmployee {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_pin: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
