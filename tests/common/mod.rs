#![allow(dead_code)]

use actix_web::{cookie::Cookie, web};
use anyhow::Result;
use fake::Fake;
use fake::faker::name::en::Name;
use sqlx::SqlitePool;
use std::env;
use tempfile::TempDir;

use timeclock::config::Config;
use timeclock::database::init_database;
use timeclock::database::models::*;
use timeclock::handlers::shared::ApiResponse;
use timeclock::services::auth::SHARED_ADMIN_SUBJECT;
use timeclock::AppState;

pub const TEST_PIN: &str = "4321";

/// Builds the full `/api` service against a context's state.
#[macro_export]
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .app_data($ctx.config_data.clone())
                .wrap(timeclock::middleware::RequestId)
                .configure(timeclock::routes::configure),
        )
        .await
    };
}

pub struct TestContext {
    pub pool: SqlitePool,
    pub config: Config,
    pub state: web::Data<AppState>,
    pub config_data: web::Data<Config>,
    _temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        Self::with_config(Config::test_config()).await
    }

    pub async fn with_config(mut config: Config) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        config.database_url = format!("sqlite:{}/test.db", temp_dir.path().display());

        let pool = init_database(&config.database_url).await?;
        let state = web::Data::new(AppState::new(pool.clone(), config.clone()));
        let config_data = web::Data::new(config.clone());

        Ok(TestContext {
            pool,
            config,
            state,
            config_data,
            _temp_dir: temp_dir,
        })
    }

    pub async fn create_employee(&self, employee_code: &str, pin: &str) -> User {
        self.insert_employee(employee_code, pin, true).await
    }

    pub async fn create_inactive_employee(&self, employee_code: &str, pin: &str) -> User {
        self.insert_employee(employee_code, pin, false).await
    }

    async fn insert_employee(&self, employee_code: &str, pin: &str, active: bool) -> User {
        let name: String = Name().fake();
        self.state
            .user_repository
            .create_user(NewUser {
                employee_code: employee_code.to_string(),
                name,
                email: None,
                pin_hash: self
                    .state
                    .auth_service
                    .hash_pin(pin)
                    .expect("Failed to hash PIN"),
                role: UserRole::Worker,
                active,
                hourly_rate: Some(18.5),
            })
            .await
            .expect("Failed to insert test employee")
    }

    pub async fn create_location(
        &self,
        code: &str,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Location {
        let location = self
            .state
            .location_repository
            .create_location(&LocationInput {
                name: format!("{code} site"),
                code: code.to_string(),
                latitude,
                longitude,
                radius_meters,
                active: None,
            })
            .await
            .expect("Failed to insert test location");
        self.state.clock_service.invalidate_locations().await;
        location
    }

    pub async fn create_time_off_request(&self, user_id: i64) -> TimeOffRequest {
        let start_date = chrono::Utc::now().date_naive() + chrono::Duration::days(7);
        self.state
            .time_off_repository
            .create_request(
                user_id,
                &TimeOffRequestInput {
                    start_date,
                    end_date: start_date + chrono::Duration::days(2),
                    request_type: TimeOffType::Vacation,
                    reason: Some("Family trip".to_string()),
                },
            )
            .await
            .expect("Failed to insert test time-off request")
    }

    /// Session cookie for the shared admin login.
    pub fn admin_cookie(&self) -> Cookie<'static> {
        let token = self
            .state
            .auth_service
            .issue_token(SHARED_ADMIN_SUBJECT, UserRole::Admin)
            .expect("Failed to issue admin token");
        self.state.auth_service.session_cookie(token)
    }

    pub fn worker_cookie(&self, user: &User) -> Cookie<'static> {
        let token = self
            .state
            .auth_service
            .issue_token(&user.id.to_string(), user.role)
            .expect("Failed to issue worker token");
        self.state.auth_service.session_cookie(token)
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count records")
    }
}

pub fn clock_body(employee_code: &str, pin: &str, lat: f64, lng: f64) -> serde_json::Value {
    serde_json::json!({
        "employeeCode": employee_code,
        "pin": pin,
        "lat": lat,
        "lng": lng,
    })
}

pub fn assert_error_body(body: &ApiResponse<serde_json::Value>) {
    assert!(!body.success, "Expected an error response");
    assert!(body.data.is_none());
    assert!(body.error.is_some(), "Expected an error message");
}

pub fn setup_test_env() {
    unsafe {
        env::set_var("RUST_LOG", "debug");
    }
    let _ = env_logger::builder().is_test(true).try_init();
}
