//! Timestamp formatting for the `created` and `modified` fields.
//!
//! Timestamps are rendered in local time at minute resolution, without
//! seconds or a timezone designator: `2025-02-10T09:15`.

use std::fmt::Display;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone, Utc};

/// Default header timestamp format.
pub const DEFAULT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Render `ts` with a strftime-style `format`.
///
/// The format must have passed [`is_valid_format`]; invalid specifiers make
/// chrono's formatter fail.
#[must_use]
pub fn format_timestamp<Tz>(ts: &DateTime<Tz>, format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.format(format).to_string()
}

/// Whether `format` only contains specifiers chrono understands.
#[must_use]
pub fn is_valid_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Convert epoch milliseconds, as reported by the document store, into
/// local time. Out-of-range values clamp to the epoch.
#[must_use]
pub fn local_from_millis(millis: i64) -> DateTime<Local> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .with_timezone(&Local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_has_minute_resolution_and_no_offset() {
        let ts = Local.with_ymd_and_hms(2025, 2, 3, 4, 5, 59).unwrap();
        assert_eq!(format_timestamp(&ts, DEFAULT_FORMAT), "2025-02-03T04:05");
    }

    #[test]
    fn format_is_zero_padded() {
        let ts = Utc.with_ymd_and_hms(987, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(&ts, DEFAULT_FORMAT), "0987-01-01T00:00");
    }

    #[test]
    fn validates_formats() {
        assert!(is_valid_format(DEFAULT_FORMAT));
        assert!(is_valid_format("%d/%m/%Y %H:%M"));
        assert!(!is_valid_format("%Y-%Q"));
        assert!(!is_valid_format(""));
    }

    #[test]
    fn millis_round_trip_through_local_time() {
        let ts = Local.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap();
        let back = local_from_millis(ts.timestamp_millis());
        assert_eq!(back, ts);
    }
}
