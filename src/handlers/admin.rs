use actix_web::{HttpResponse, Result, web};

use crate::AppState;
use crate::database::models::{
    Action, AuditLogQuery, CreateEmployeeInput, CreatedEmployee, EmployeeQuery, EntityType,
    LocationInput, LocationQuery, NewUser, ReviewInput, ShiftQuery, TimeOffQuery, TimeOffStatus,
    UpdateEmployeeInput, UpdateLocationInput, UpdateShiftInput,
};
use crate::error::AppError;
use crate::geofence::Coordinates;
use crate::handlers::shared::ApiResponse;
use crate::middleware::RequestInfo;
use crate::services::{
    Claims, audit_logger,
    auth::{generate_pin, validate_employee_code, validate_pin},
};

fn validate_radius(radius_meters: f64) -> Result<(), AppError> {
    if !radius_meters.is_finite() || radius_meters < 0.0 {
        return Err(AppError::BadRequest(
            "Radius must be zero (ADHOC) or a positive number of meters".to_string(),
        ));
    }
    Ok(())
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

async fn audit(
    state: &AppState,
    claims: &Claims,
    action: &str,
    entity_type: &str,
    entity_id: i64,
    description: String,
    req_info: &RequestInfo,
) {
    if let Err(e) = state
        .audit_logger
        .log(
            claims.actor(),
            action,
            entity_type,
            Some(entity_id),
            description,
            None,
            req_info,
        )
        .await
    {
        log::warn!("Failed to log {} {} activity: {}", entity_type, action, e);
    }
}

// Location handlers
pub async fn get_locations(
    claims: Claims,
    state: web::Data<AppState>,
    query: web::Query<LocationQuery>,
) -> Result<HttpResponse> {
    claims.requires_admin()?;

    let locations = state
        .location_repository
        .list_locations(query.include_inactive)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(locations))
}

pub async fn create_location(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<LocationInput>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    claims.requires_admin()?;

    let mut input = input.into_inner();
    input.name = required(&input.name, "Name")?;
    input.code = required(&input.code, "Code")?;
    Coordinates::new(input.latitude, input.longitude).map_err(AppError::from)?;
    validate_radius(input.radius_meters)?;

    let location = state
        .location_repository
        .create_location(&input)
        .await
        .map_err(AppError::from)?;
    state.clock_service.invalidate_locations().await;

    audit(
        &state,
        &claims,
        Action::CREATED,
        EntityType::LOCATION,
        location.id,
        format!("Location '{}' created", location.name),
        &req_info,
    )
    .await;

    Ok(ApiResponse::created(location))
}

pub async fn get_location(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    claims.requires_admin()?;
    let location_id = path.into_inner();

    let location = state
        .location_repository
        .find_by_id(location_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Location not found".to_string()))?;

    Ok(ApiResponse::success(location))
}

pub async fn update_location(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    input: web::Json<UpdateLocationInput>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    claims.requires_admin()?;
    let location_id = path.into_inner();
    let mut input = input.into_inner();

    if let Some(name) = &input.name {
        input.name = Some(required(name, "Name")?);
    }
    if let Some(code) = &input.code {
        input.code = Some(required(code, "Code")?);
    }
    if let Some(radius) = input.radius_meters {
        validate_radius(radius)?;
    }

    let existing = state
        .location_repository
        .find_by_id(location_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Location not found".to_string()))?;

    // Validate the center the row will end up with.
    Coordinates::new(
        input.latitude.unwrap_or(existing.latitude),
        input.longitude.unwrap_or(existing.longitude),
    )
    .map_err(AppError::from)?;

    let location = state
        .location_repository
        .update_location(location_id, &input)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Location not found".to_string()))?;
    state.clock_service.invalidate_locations().await;

    audit(
        &state,
        &claims,
        Action::UPDATED,
        EntityType::LOCATION,
        location.id,
        format!("Location '{}' updated", location.name),
        &req_info,
    )
    .await;

    Ok(ApiResponse::success(location))
}

pub async fn delete_location(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    claims.requires_admin()?;
    let location_id = path.into_inner();

    let location = state
        .location_repository
        .deactivate_location(location_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Location not found".to_string()))?;
    state.clock_service.invalidate_locations().await;

    audit(
        &state,
        &claims,
        Action::DEACTIVATED,
        EntityType::LOCATION,
        location.id,
        format!("Location '{}' deactivated", location.name),
        &req_info,
    )
    .await;

    Ok(ApiResponse::success(location))
}

// Employee handlers
pub async fn get_employees(
    claims: Claims,
    state: web::Data<AppState>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse> {
    claims.requires_admin()?;

    let users = state
        .user_repository
        .list_users(query.active)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(users))
}

pub async fn create_employee(
    claims: Claims,
    state: web::Data<AppState>,
    input: web::Json<CreateEmployeeInput>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    claims.requires_admin()?;

    let input = input.into_inner();
    let employee_code = input.employee_code.trim().to_string();
    validate_employee_code(&employee_code)?;
    let name = required(&input.name, "Name")?;
    if let Some(rate) = input.hourly_rate {
        if !rate.is_finite() || rate < 0.0 {
            return Err(AppError::BadRequest("Hourly rate must be non-negative".to_string()).into());
        }
    }

    let (pin, generated_pin) = match input.pin {
        Some(pin) => {
            validate_pin(&pin)?;
            (pin, None)
        }
        None => {
            let pin = generate_pin();
            (pin.clone(), Some(pin))
        }
    };

    // Checked up front so a duplicate never pays for a bcrypt hash; the unique
    // index still guards concurrent creates.
    if state
        .user_repository
        .employee_code_exists(&employee_code)
        .await
        .map_err(AppError::from)?
    {
        return Err(AppError::Conflict("Employee code already exists".to_string()).into());
    }

    let user = state
        .user_repository
        .create_user(NewUser {
            employee_code,
            name,
            email: input.email,
            pin_hash: state.auth_service.hash_pin(&pin)?,
            role: input.role.unwrap_or_default(),
            active: input.active.unwrap_or(true),
            hourly_rate: input.hourly_rate,
        })
        .await
        .map_err(AppError::from)?;

    audit(
        &state,
        &claims,
        Action::CREATED,
        EntityType::USER,
        user.id,
        format!("Employee {} created", user.employee_code),
        &req_info,
    )
    .await;

    Ok(ApiResponse::created(CreatedEmployee {
        user,
        generated_pin,
    }))
}

pub async fn get_employee(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    claims.requires_admin()?;
    let user_id = path.into_inner();

    let user = state
        .user_repository
        .find_by_id(user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    Ok(ApiResponse::success(user))
}

pub async fn update_employee(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    input: web::Json<UpdateEmployeeInput>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    claims.requires_admin()?;
    let user_id = path.into_inner();
    let mut input = input.into_inner();

    if let Some(name) = &input.name {
        input.name = Some(required(name, "Name")?);
    }
    let pin_hash = match &input.pin {
        Some(pin) => {
            validate_pin(pin)?;
            Some(state.auth_service.hash_pin(pin)?)
        }
        None => None,
    };

    let user = state
        .user_repository
        .update_user(user_id, &input, pin_hash.as_deref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    let description = if pin_hash.is_some() {
        format!("Employee {} updated (PIN reset)", user.employee_code)
    } else {
        format!("Employee {} updated", user.employee_code)
    };
    audit(
        &state,
        &claims,
        Action::UPDATED,
        EntityType::USER,
        user.id,
        description,
        &req_info,
    )
    .await;

    Ok(ApiResponse::success(user))
}

pub async fn delete_employee(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    claims.requires_admin()?;
    let user_id = path.into_inner();

    let user = state
        .user_repository
        .deactivate_user(user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    audit(
        &state,
        &claims,
        Action::DEACTIVATED,
        EntityType::USER,
        user.id,
        format!("Employee {} deactivated", user.employee_code),
        &req_info,
    )
    .await;

    Ok(ApiResponse::success(user))
}

// Shift handlers
pub async fn get_shifts(
    claims: Claims,
    state: web::Data<AppState>,
    query: web::Query<ShiftQuery>,
) -> Result<HttpResponse> {
    claims.requires_admin()?;

    let shifts = state
        .shift_repository
        .find_by_query(&query)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(shifts))
}

pub async fn get_shift(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    claims.requires_admin()?;
    let shift_id = path.into_inner();

    let shift = state
        .shift_repository
        .find_by_id(shift_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    Ok(ApiResponse::success(shift))
}

pub async fn update_shift(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    input: web::Json<UpdateShiftInput>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    claims.requires_admin()?;
    let shift_id = path.into_inner();
    let input = input.into_inner();

    let existing = state
        .shift_repository
        .find_by_id(shift_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    let clock_in = input.clock_in.unwrap_or(existing.clock_in);
    if let Some(clock_out) = input.clock_out.or(existing.clock_out) {
        if clock_out <= clock_in {
            return Err(AppError::BadRequest("Clock out must be after clock in".to_string()).into());
        }
    }

    if let Some(location_id) = input.location_id {
        state
            .location_repository
            .find_by_id(location_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::BadRequest("Unknown location".to_string()))?;
    }

    let shift = state
        .shift_repository
        .update_shift(shift_id, &input)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Shift not found".to_string()))?;

    audit(
        &state,
        &claims,
        Action::UPDATED,
        EntityType::SHIFT,
        shift.id,
        format!("Shift {} corrected", shift.id),
        &req_info,
    )
    .await;

    Ok(ApiResponse::success(shift))
}

pub async fn delete_shift(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    claims.requires_admin()?;
    let shift_id = path.into_inner();

    let deleted = state
        .shift_repository
        .delete_shift(shift_id)
        .await
        .map_err(AppError::from)?;
    if !deleted {
        return Err(AppError::NotFound("Shift not found".to_string()).into());
    }

    audit(
        &state,
        &claims,
        Action::DELETED,
        EntityType::SHIFT,
        shift_id,
        format!("Shift {} deleted", shift_id),
        &req_info,
    )
    .await;

    Ok(HttpResponse::NoContent().finish())
}

// Time-off review
pub async fn get_time_off_requests(
    claims: Claims,
    state: web::Data<AppState>,
    query: web::Query<TimeOffQuery>,
) -> Result<HttpResponse> {
    claims.requires_admin()?;

    let requests = state
        .time_off_repository
        .find_by_query(&query)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(requests))
}

async fn review_time_off(
    claims: Claims,
    state: web::Data<AppState>,
    request_id: i64,
    notes: Option<String>,
    status: TimeOffStatus,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    claims.requires_admin()?;

    let existing = state
        .time_off_repository
        .find_by_id(request_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Time-off request not found".to_string()))?;

    let request = state
        .time_off_repository
        .resolve_pending(request_id, status, Some(&claims.actor()), notes.as_deref())
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Time-off request is already {}",
                existing.status
            ))
        })?;

    let verb = match status {
        TimeOffStatus::Approved => Action::APPROVED,
        _ => Action::DENIED,
    };

    let message = match &request.review_notes {
        Some(notes) => format!(
            "Your {} request for {} to {} was {}: {}",
            request.request_type, request.start_date, request.end_date, verb, notes
        ),
        None => format!(
            "Your {} request for {} to {} was {}",
            request.request_type, request.start_date, request.end_date, verb
        ),
    };
    if let Err(e) = state
        .notification_repository
        .create(request.user_id, &format!("Time off {verb}"), &message)
        .await
    {
        log::warn!("Failed to notify employee {}: {}", request.user_id, e);
    }

    audit(
        &state,
        &claims,
        verb,
        EntityType::TIME_OFF,
        request.id,
        format!("Time-off request {} {}", request.id, verb),
        &req_info,
    )
    .await;

    Ok(ApiResponse::success(request))
}

pub async fn approve_time_off_request(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    input: Option<web::Json<ReviewInput>>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    let notes = input.and_then(|i| i.into_inner().notes);
    review_time_off(
        claims,
        state,
        path.into_inner(),
        notes,
        TimeOffStatus::Approved,
        req_info,
    )
    .await
}

pub async fn deny_time_off_request(
    claims: Claims,
    state: web::Data<AppState>,
    path: web::Path<i64>,
    input: Option<web::Json<ReviewInput>>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    let notes = input.and_then(|i| i.into_inner().notes);
    review_time_off(
        claims,
        state,
        path.into_inner(),
        notes,
        TimeOffStatus::Denied,
        req_info,
    )
    .await
}

// Audit log
pub async fn get_audit_logs(
    claims: Claims,
    state: web::Data<AppState>,
    query: web::Query<AuditLogQuery>,
) -> Result<HttpResponse> {
    claims.requires_admin()?;

    let logs = state
        .audit_repository
        .find_by_query(&query)
        .await
        .map_err(AppError::from)?;

    Ok(ApiResponse::success(logs))
}
