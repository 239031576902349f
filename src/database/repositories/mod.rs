pub mod audit;
pub mod location;
pub mod notification;
pub mod shift;
pub mod time_off;
pub mod user;

// Re-export all repositories for easy importing
pub use audit::AuditRepository;
pub use location::LocationRepository;
pub use notification::NotificationRepository;
pub use shift::ShiftRepository;
pub use time_off::TimeOffRepository;
pub use user::UserRepository;
