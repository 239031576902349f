use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::location::Location;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: i64,
    pub user_id: i64,
    /// None for ADHOC shifts.
    pub location_id: Option<i64>,
    pub clock_in: DateTime<Utc>,
    /// None while the shift is open.
    pub clock_out: Option<DateTime<Utc>>,
    pub clock_in_lat: f64,
    pub clock_in_lng: f64,
    pub clock_out_lat: Option<f64>,
    pub clock_out_lng: Option<f64>,
    pub is_adhoc: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    /// Whole minutes worked, for closed shifts only.
    pub fn worked_minutes(&self) -> Option<i64> {
        self.clock_out
            .map(|clock_out| (clock_out - self.clock_in).num_minutes())
    }
}

#[derive(Debug, Clone)]
pub struct OpenShiftInput {
    pub user_id: i64,
    pub location_id: Option<i64>,
    pub clock_in: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub is_adhoc: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CloseShiftInput {
    pub clock_out: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Only applied when the open shift has no location yet.
    pub location_id: Option<i64>,
    pub notes: Option<String>,
}

/// Admin correction of a recorded shift. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShiftInput {
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
    pub location_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftQuery {
    pub user_id: Option<i64>,
    pub location_id: Option<i64>,
    #[serde(default)]
    pub open_only: bool,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockAction {
    ClockIn,
    ClockOut,
}

impl ClockAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClockAction::ClockIn => "clock_in",
            ClockAction::ClockOut => "clock_out",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockRequest {
    pub employee_code: String,
    pub pin: String,
    pub lat: f64,
    pub lng: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockOutcome {
    pub action: ClockAction,
    pub shift: Shift,
    pub location: Option<Location>,
    pub adhoc: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
}
