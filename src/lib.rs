pub mod config;
pub mod database;
pub mod error;
pub mod geofence;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

use sqlx::SqlitePool;

pub use config::Config;
pub use database::repositories::{
    AuditRepository, LocationRepository, NotificationRepository, ShiftRepository,
    TimeOffRepository, UserRepository,
};
pub use services::{AuditLogger, AuthService, ClockService};

pub struct AppState {
    pub config: Config,
    pub auth_service: AuthService,
    pub clock_service: ClockService,
    pub audit_logger: AuditLogger,
    pub user_repository: UserRepository,
    pub location_repository: LocationRepository,
    pub shift_repository: ShiftRepository,
    pub time_off_repository: TimeOffRepository,
    pub notification_repository: NotificationRepository,
    pub audit_repository: AuditRepository,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let user_repository = UserRepository::new(pool.clone());
        let location_repository = LocationRepository::new(pool.clone());
        let audit_repository = AuditRepository::new(pool.clone());

        let auth_service = AuthService::new(user_repository.clone(), config.clone());
        let clock_service = ClockService::new(
            pool.clone(),
            auth_service.clone(),
            location_repository.clone(),
            config.location_cache_ttl_seconds,
        );

        Self {
            auth_service,
            clock_service,
            audit_logger: AuditLogger::new(audit_repository.clone()),
            user_repository,
            location_repository,
            shift_repository: ShiftRepository::new(pool.clone()),
            time_off_repository: TimeOffRepository::new(pool.clone()),
            notification_repository: NotificationRepository::new(pool),
            audit_repository,
            config,
        }
    }
}
