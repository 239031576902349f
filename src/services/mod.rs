pub mod audit_logger;
pub mod auth;
pub mod clock;

pub use audit_logger::AuditLogger;
pub use auth::{AuthService, Claims};
pub use clock::ClockService;
