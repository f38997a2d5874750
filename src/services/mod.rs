pub mod dismissals;
pub mod metrics;
pub mod redis_store;
pub mod selector;
pub mod sessions;
