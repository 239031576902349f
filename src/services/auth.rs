use actix_web::{
    FromRequest, HttpRequest,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    dev::Payload,
    web::Data,
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use moka::future::Cache;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    future::{Ready, ready},
    sync::LazyLock,
    time::Duration as StdDuration,
};

use crate::config::Config;
use crate::database::models::{User, UserRole};
use crate::database::repositories::UserRepository;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session";

/// Subject used for sessions opened with the shared admin password.
pub const SHARED_ADMIN_SUBJECT: &str = "admin";

const INVALID_CREDENTIALS: &str = "Invalid employee code or PIN";

static EMPLOYEE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{2,32}$").expect("valid employee code regex"));
static PIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4,8}$").expect("valid PIN regex"));

pub fn validate_employee_code(code: &str) -> Result<(), AppError> {
    if EMPLOYEE_CODE_RE.is_match(code) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Employee code must be 2-32 letters, digits, '-' or '_'".to_string(),
        ))
    }
}

pub fn validate_pin(pin: &str) -> Result<(), AppError> {
    if PIN_RE.is_match(pin) {
        Ok(())
    } else {
        Err(AppError::BadRequest("PIN must be 4-8 digits".to_string()))
    }
}

pub fn generate_pin() -> String {
    let mut rng = rand::rng();
    (0..6)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id, or "admin" for the shared password
    pub role: UserRole,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// The employee behind the session, if any.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    pub fn requires_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    pub fn requires_employee(&self) -> Result<i64, AppError> {
        self.user_id().ok_or_else(|| {
            AppError::Forbidden("This session is not linked to an employee".to_string())
        })
    }

    /// Audit-log actor string.
    pub fn actor(&self) -> String {
        match self.user_id() {
            Some(id) => format!("user:{id}"),
            None => SHARED_ADMIN_SUBJECT.to_string(),
        }
    }
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        log::debug!("Rejected session token: {}", e);
        AppError::unauthorized("Invalid or expired session")
    })
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(config) = req.app_data::<Data<Config>>() else {
            log::error!("Config missing from app data; cannot validate sessions");
            return ready(Err(AppError::internal_server_error()));
        };

        let token = req
            .cookie(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .or_else(|| bearer_token(req));

        ready(match token {
            Some(token) => decode_claims(&token, &config.jwt_secret),
            None => Err(AppError::Unauthorized(None)),
        })
    }
}

/// Counts PIN failures per employee code. Entries expire `pin_lockout_seconds`
/// after the latest failure.
#[derive(Clone)]
pub struct PinThrottle {
    failures: Cache<String, u32>,
    max_attempts: u32,
}

impl PinThrottle {
    pub fn new(max_attempts: u32, lockout_seconds: u64) -> Self {
        Self {
            failures: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(StdDuration::from_secs(lockout_seconds))
                .build(),
            max_attempts,
        }
    }

    pub async fn check(&self, employee_code: &str) -> Result<(), AppError> {
        let failures = self.failures.get(employee_code).await.unwrap_or(0);
        if self.max_attempts > 0 && failures >= self.max_attempts {
            log::warn!("PIN attempts locked for employee code {}", employee_code);
            return Err(AppError::TooManyRequests(
                "Too many failed PIN attempts, try again later".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn record_failure(&self, employee_code: &str) {
        let failures = self.failures.get(employee_code).await.unwrap_or(0);
        self.failures
            .insert(employee_code.to_string(), failures + 1)
            .await;
    }

    pub async fn reset(&self, employee_code: &str) {
        self.failures.invalidate(employee_code).await;
    }
}

#[derive(Clone)]
pub struct AuthService {
    user_repository: UserRepository,
    throttle: PinThrottle,
    config: Config,
}

impl AuthService {
    pub fn new(user_repository: UserRepository, config: Config) -> Self {
        let throttle = PinThrottle::new(config.max_failed_pin_attempts, config.pin_lockout_seconds);
        Self {
            user_repository,
            throttle,
            config,
        }
    }

    pub fn hash_pin(&self, pin: &str) -> Result<String, AppError> {
        Ok(hash(pin, self.config.bcrypt_cost)?)
    }

    /// Resolves an active employee from code + PIN.
    ///
    /// Unknown codes, inactive employees and wrong PINs share one error so the
    /// response does not reveal which codes exist.
    pub async fn authenticate_pin(&self, employee_code: &str, pin: &str) -> Result<User, AppError> {
        self.throttle.check(employee_code).await?;

        let user = self
            .user_repository
            .find_by_employee_code(employee_code)
            .await?;

        let Some(user) = user.filter(|u| u.active) else {
            self.throttle.record_failure(employee_code).await;
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify(pin, &user.pin_hash)? {
            self.throttle.record_failure(employee_code).await;
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        self.throttle.reset(employee_code).await;
        Ok(user)
    }

    pub fn check_admin_password(&self, password: &str) -> Result<(), AppError> {
        if password.is_empty() || password != self.config.admin_password {
            return Err(AppError::unauthorized("Invalid admin password"));
        }
        Ok(())
    }

    pub fn issue_token(&self, subject: &str, role: UserRole) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::hours(self.config.session_expiration_hours);

        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::internal_server_error_message(format!("Token encoding failed: {e}")))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        decode_claims(token, &self.config.jwt_secret)
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.config.is_production())
            .max_age(CookieDuration::hours(self.config.session_expiration_hours))
            .finish()
    }

    pub fn clear_session_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .finish();
        cookie.make_removal();
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_codes_and_pins_are_validated() {
        assert!(validate_employee_code("EMP-001").is_ok());
        assert!(validate_employee_code("a").is_err());
        assert!(validate_employee_code("has space").is_err());
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin("12345678").is_ok());
        assert!(validate_pin("123").is_err());
        assert!(validate_pin("12ab").is_err());
    }

    #[test]
    fn generated_pins_are_valid() {
        for _ in 0..20 {
            let pin = generate_pin();
            assert_eq!(pin.len(), 6);
            assert!(validate_pin(&pin).is_ok());
        }
    }

    #[test]
    fn claims_actor_distinguishes_shared_admin() {
        let admin = Claims {
            sub: SHARED_ADMIN_SUBJECT.to_string(),
            role: UserRole::Admin,
            iat: 0,
            exp: 0,
        };
        let worker = Claims {
            sub: "42".to_string(),
            role: UserRole::Worker,
            iat: 0,
            exp: 0,
        };

        assert_eq!(admin.actor(), "admin");
        assert!(admin.requires_admin().is_ok());
        assert!(admin.requires_employee().is_err());
        assert_eq!(worker.actor(), "user:42");
        assert_eq!(worker.requires_employee().unwrap(), 42);
        assert!(worker.requires_admin().is_err());
    }

    #[actix_rt::test]
    async fn throttle_locks_after_max_failures_and_resets() {
        let throttle = PinThrottle::new(2, 60);

        assert!(throttle.check("EMP1").await.is_ok());
        throttle.record_failure("EMP1").await;
        assert!(throttle.check("EMP1").await.is_ok());
        throttle.record_failure("EMP1").await;
        assert!(matches!(
            throttle.check("EMP1").await,
            Err(AppError::TooManyRequests(_))
        ));
        assert!(throttle.check("EMP2").await.is_ok());

        throttle.reset("EMP1").await;
        assert!(throttle.check("EMP1").await.is_ok());
    }
}
