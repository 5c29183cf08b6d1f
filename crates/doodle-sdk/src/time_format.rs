//! Short display strings for message timestamps.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};

/// Messages younger than this many whole hours show the time only.
pub const RECENT_WINDOW_HOURS: i64 = 12;

/// Format `timestamp` relative to `now`, rendered in `tz`.
///
/// Fewer than [`RECENT_WINDOW_HOURS`] elapsed whole hours gives `HH:mm`;
/// anything older gives `DD MMM YYYY HH:mm`. Timestamps in the future count
/// as recent.
pub fn format_time<Tz>(timestamp: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let local = timestamp.with_timezone(tz);
    if (now - timestamp).num_hours() < RECENT_WINDOW_HOURS {
        local.format("%H:%M").to_string()
    } else {
        local.format("%d %b %Y %H:%M").to_string()
    }
}

/// [`format_time`] in the machine's local time zone.
pub fn format_local(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_time(timestamp, now, &Local)
}
