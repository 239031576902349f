use actix_web::{HttpResponse, Result, web};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::database::models::{
    Action, EntityType, NewUser, RegisterWorkerInput, User, UserRole,
};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::middleware::RequestInfo;
use crate::services::auth::{SHARED_ADMIN_SUBJECT, validate_employee_code, validate_pin};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerLoginRequest {
    pub employee_code: String,
    pub pin: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

pub async fn admin_login(
    state: web::Data<AppState>,
    input: web::Json<AdminLoginRequest>,
    req_info: RequestInfo,
) -> Result<HttpResponse> {
    if let Err(e) = state.auth_service.check_admin_password(&input.password) {
        log::warn!("Failed admin login from {}", req_info.ip_address);
        return Err(e.into());
    }

    let token = state
        .auth_service
        .issue_token(SHARED_ADMIN_SUBJECT, UserRole::Admin)?;

    if let Err(e) = state
        .audit_logger
        .log(
            SHARED_ADMIN_SUBJECT.to_string(),
            Action::LOGIN,
            EntityType::SESSION,
            None,
            "Admin signed in with the shared password".to_string(),
            None,
            &req_info,
        )
        .await
    {
        log::warn!("Failed to log admin login: {}", e);
    }

    Ok(HttpResponse::Ok()
        .cookie(state.auth_service.session_cookie(token))
        .json(ApiResponse::body(
            SessionResponse {
                role: UserRole::Admin,
                user: None,
            },
            None,
        )))
}

pub async fn worker_login(
    state: web::Data<AppState>,
    input: web::Json<WorkerLoginRequest>,
) -> Result<HttpResponse> {
    let user = state
        .auth_service
        .authenticate_pin(input.employee_code.trim(), &input.pin)
        .await?;

    let token = state
        .auth_service
        .issue_token(&user.id.to_string(), user.role)?;

    log::info!("Employee {} signed in", user.employee_code);

    Ok(HttpResponse::Ok()
        .cookie(state.auth_service.session_cookie(token))
        .json(ApiResponse::body(
            SessionResponse {
                role: user.role,
                user: Some(user),
            },
            None,
        )))
}

pub async fn register(
    state: web::Data<AppState>,
    input: web::Json<RegisterWorkerInput>,
) -> Result<HttpResponse> {
    if !state.config.allow_self_registration {
        return Err(AppError::Forbidden("Self registration is disabled".to_string()).into());
    }

    let input = input.into_inner();
    let employee_code = input.employee_code.trim().to_string();
    let name = input.name.trim().to_string();

    validate_employee_code(&employee_code)?;
    validate_pin(&input.pin)?;
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()).into());
    }

    let user = state
        .user_repository
        .create_user(NewUser {
            employee_code,
            name,
            email: input.email,
            pin_hash: state.auth_service.hash_pin(&input.pin)?,
            role: UserRole::Worker,
            active: true,
            hourly_rate: None,
        })
        .await
        .map_err(AppError::from)?;

    log::info!("Employee {} registered", user.employee_code);

    Ok(ApiResponse::created(user))
}

pub async fn logout(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok()
        .cookie(state.auth_service.clear_session_cookie())
        .json(ApiResponse::<()>::body((), Some("Signed out".to_string()))))
}
