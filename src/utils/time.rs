//! Block timestamp rendering

use chrono::{TimeZone, Utc};

/// Convert Unix timestamp to an RFC 3339 string (`2024-01-01T00:00:00+00:00`)
///
/// Returns the Unix epoch for out-of-range timestamps.
///
/// # Examples
/// ```
/// use ghosttag::utils::time::timestamp_to_iso;
/// assert_eq!(timestamp_to_iso(0), "1970-01-01T00:00:00+00:00");
/// assert_eq!(timestamp_to_iso(1704067200), "2024-01-01T00:00:00+00:00");
/// ```
pub fn timestamp_to_iso(timestamp: i64) -> String {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "1970-01-01T00:00:00+00:00".to_string())
}
