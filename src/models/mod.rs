pub mod announcement;
pub mod console_config;
pub mod header;
