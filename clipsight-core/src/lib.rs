pub mod quota;
pub mod settings;
