pub mod analyze;
pub mod health;
pub mod info;
pub mod quota;
pub mod verify;
