//! Clipsight server library
//!
//! Exposes the router and application state so integration tests can drive
//! the API in-process.

pub mod api;
pub mod app_state;
pub mod http;
pub mod init_telemetry;
pub mod services;
pub mod settings;

pub use app_state::AppState;
