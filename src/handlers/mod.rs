pub mod admin;
pub mod auth;
pub mod clock;
pub mod shared;
pub mod worker;
