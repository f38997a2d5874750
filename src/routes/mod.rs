pub mod announcements;
pub mod header;
pub mod health;
pub mod metrics;
