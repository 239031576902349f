use actix_web::{HttpResponse, Result, web};

use crate::AppState;
use crate::database::models::{Action, ClockAction, ClockRequest, EntityType};
use crate::handlers::shared::ApiResponse;
use crate::middleware::RequestInfo;
use crate::services::audit_logger;

/// POST /api/clock
///
/// Opens a shift when the employee has none open, otherwise closes it.
pub async fn clock(
    state: web::Data<AppState>,
    input: web::Json<ClockRequest>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    let (user_id, outcome) = state.clock_service.clock(input.into_inner()).await?;

    let action = match outcome.action {
        ClockAction::ClockIn => Action::CLOCK_IN,
        ClockAction::ClockOut => Action::CLOCK_OUT,
    };
    let mut pairs = vec![
        ("adhoc", outcome.adhoc.to_string()),
        (
            "location_id",
            outcome
                .shift
                .location_id
                .map_or("None".to_string(), |id| id.to_string()),
        ),
    ];
    if let Some(distance) = outcome.distance_meters {
        pairs.push(("distance_meters", format!("{distance:.1}")));
    }

    if let Err(e) = state
        .audit_logger
        .log(
            format!("user:{user_id}"),
            action,
            EntityType::SHIFT,
            Some(outcome.shift.id),
            format!("Shift {} via {}", outcome.shift.id, action),
            Some(audit_logger::metadata(pairs)),
            &req_info,
        )
        .await
    {
        log::warn!("Failed to log clock activity: {}", e);
    }

    let message = match outcome.action {
        ClockAction::ClockIn => "Clocked in",
        ClockAction::ClockOut => "Clocked out",
    };

    Ok(ApiResponse::success_with_message(outcome, message))
}
