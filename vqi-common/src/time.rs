//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Format used for every timestamp written into index metadata
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SSZ` (second precision, UTC)
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.format(ISO_FORMAT).to_string()
}

/// Current UTC time as an ISO-8601 string
pub fn now_iso() -> String {
    iso_timestamp(now())
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}
