use actix_web::{HttpResponse, Result, web};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::database::models::{
    NotificationQuery, Shift, ShiftQuery, TimeOffQuery, TimeOffRequestInput, TimeOffStatus, User,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::Claims;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStatus {
    pub user: User,
    pub clocked_in: bool,
    pub open_shift: Option<Shift>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Active employee behind the session.
async fn current_user(claims: &Claims, state: &AppState) -> Result<User, AppError> {
    let user_id = claims.requires_employee()?;

    state
        .user_repository
        .find_by_id(user_id)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| AppError::unauthorized("Employee account is no longer active"))
}

pub async fn me(claims: Claims, state: web::Data<AppState>) -> Result<HttpResponse> {
    let user = current_user(&claims, &state).await?;

    let open_shift = state
        .shift_repository
        .find_open_shift(user.id)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(WorkerStatus {
        user,
        clocked_in: open_shift.is_some(),
        open_shift,
    }))
}

pub async fn my_shifts(
    claims: Claims,
    state: web::Data<AppState>,
    page: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let user = current_user(&claims, &state).await?;

    let query = ShiftQuery {
        user_id: Some(user.id),
        limit: page.limit,
        offset: page.offset,
        ..Default::default()
    };
    let shifts = state
        .shift_repository
        .find_by_query(&query)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(shifts))
}

pub async fn create_time_off_request(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<TimeOffRequestInput>,
) -> Result<HttpResponse> {
    let user = current_user(&claims, &state).await?;
    let mut input = input.into_inner();

    if input.end_date < input.start_date {
        return Err(AppError::BadRequest("End date must not be before start date".to_string()).into());
    }
    input.reason = input
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());

    let request = state
        .time_off_repository
        .create_request(user.id, &input)
        .await
        .map_err(AppError::from)?;

    log::info!(
        "Employee {} requested {} day(s) of {} time off",
        user.employee_code,
        request.days(),
        request.request_type
    );

    Ok(ApiResponse::created(request))
}

pub async fn my_time_off_requests(
    claims: Claims,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let user = current_user(&claims, &state).await?;

    let requests = state
        .time_off_repository
        .find_by_query(&TimeOffQuery {
            user_id: Some(user.id),
            status: None,
        })
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(requests))
}

pub async fn cancel_time_off_request(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&claims, &state).await?;
    let request_id = path.into_inner();

    let existing = state
        .time_off_repository
        .find_by_id(request_id)
        .await
        .map_err(AppError::from)?
        .filter(|r| r.user_id == user.id)
        .ok_or_else(|| AppError::NotFound("Time-off request not found".to_string()))?;

    let request = state
        .time_off_repository
        .resolve_pending(request_id, TimeOffStatus::Cancelled, None, None)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Only pending requests can be cancelled (this one is {})",
                existing.status
            ))
        })?;

    Ok(ApiResponse::success(request))
}

pub async fn my_notifications(
    claims: Claims,
    state: web::Data<AppState>,
    query: web::Query<NotificationQuery>,
) -> Result<HttpResponse> {
    let user = current_user(&claims, &state).await?;

    let notifications = state
        .notification_repository
        .list_for_user(user.id, query.unread_only)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(notifications))
}

pub async fn mark_notification_read(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = current_user(&claims, &state).await?;

    let notification = state
        .notification_repository
        .mark_read(path.into_inner(), user.id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    Ok(ApiResponse::success(notification))
}
