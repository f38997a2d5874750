use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_int_gauge, CounterVec, IntGauge};

lazy_static! {
    pub static ref DISMISSALS_COUNTER: CounterVec = register_counter_vec!(
        "console_announcement_dismissals_total",
        "Announcements dismissed, by whether another one was left to show",
        &["outcome"]
    ).unwrap();

    pub static ref STORE_ERRORS_COUNTER: CounterVec = register_counter_vec!(
        "console_dismissal_store_errors_total",
        "Failed dismissal store operations, by operation",
        &["op"]
    ).unwrap();

    pub static ref SESSIONS_GAUGE: IntGauge = register_int_gauge!(
        "console_header_sessions",
        "Clients with a live announcement selection"
    ).unwrap();
}
