pub mod admission;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
