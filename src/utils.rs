//! Utility functions for the standings service

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Express a duration in fractional milliseconds for log lines
pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
