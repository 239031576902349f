pub mod audit;
pub mod location;
pub(crate) mod macros;
pub mod notification;
pub mod shift;
pub mod time_off;
pub mod user;

// Re-export all models for easy importing
pub use audit::*;
pub use location::*;
pub use notification::*;
pub use shift::*;
pub use time_off::*;
pub use user::*;
