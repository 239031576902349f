use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::geofence::CoordinateError;
use crate::handlers::shared::ApiResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{}", .0.as_deref().unwrap_or("Unauthorized access"))]
    Unauthorized(Option<String>),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        // Database details stay in the log.
        let error_message = match self {
            AppError::DatabaseError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        if status_code.is_server_error() {
            log::error!("Request failed with status {}: {}", status_code, self);
        } else {
            log::warn!("Request failed with status {}: {}", status_code, self);
        }

        HttpResponse::build(status_code).json(ApiResponse::<()>::error(&error_message))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                log::warn!("Unique constraint violated: {}", db_error);
                return AppError::Conflict(unique_violation_message(db_error.message()));
            }
        }

        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

impl From<CoordinateError> for AppError {
    fn from(error: CoordinateError) -> Self {
        AppError::BadRequest(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> Self {
        log::error!("PIN hashing failed: {}", error);
        AppError::internal_server_error()
    }
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(Some(message.into()))
    }

    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }

    pub fn internal_server_error() -> Self {
        AppError::InternalServerError(None)
    }
}

/// Maps SQLite's "UNIQUE constraint failed: table.column" onto a message a client can act on.
fn unique_violation_message(raw: &str) -> String {
    if raw.contains("users.employee_code") {
        "Employee code already exists".to_string()
    } else if raw.contains("locations.code") {
        "Location code already exists".to_string()
    } else if raw.contains("shifts.user_id") {
        "An open shift already exists for this employee".to_string()
    } else {
        "Record already exists".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_category() {
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized(None).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::TooManyRequests("x".into()).status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::internal_server_error().status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unauthorized_message_defaults_when_absent() {
        assert_eq!(AppError::Unauthorized(None).to_string(), "Unauthorized access");
        assert_eq!(
            AppError::unauthorized("Invalid employee code or PIN").to_string(),
            "Invalid employee code or PIN"
        );
    }

    #[test]
    fn unique_violations_name_the_duplicated_field() {
        assert_eq!(
            unique_violation_message("UNIQUE constraint failed: users.employee_code"),
            "Employee code already exists"
        );
        assert_eq!(
            unique_violation_message("UNIQUE constraint failed: shifts.user_id"),
            "An open shift already exists for this employee"
        );
    }
}
