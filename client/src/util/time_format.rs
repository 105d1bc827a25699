//! Timestamp parsing and clock formatting for chat messages.
//!
//! The message table stores ISO-8601 strings. Rows written by the widget carry
//! an explicit offset (`...Z`), while a plain `timestamp` column comes back
//! without one; those are read as UTC.

#[cfg(test)]
#[path = "time_format_test.rs"]
mod time_format_test;

use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Parse a wire timestamp into a point in time.
///
/// # Errors
///
/// Returns the RFC 3339 parse error when the value is neither RFC 3339 nor an
/// offset-less ISO-8601 date-time.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    let raw = raw.trim();
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(ts) => Ok(ts),
        Err(err) => PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT)
            .map(PrimitiveDateTime::assume_utc)
            .map_err(|_| err),
    }
}

/// Format a timestamp for the wire (RFC 3339, UTC).
///
/// # Errors
///
/// Fails only for dates RFC 3339 cannot represent (years outside 0..=9999).
pub fn format_timestamp(ts: OffsetDateTime) -> Result<String, time::error::Format> {
    ts.to_offset(UtcOffset::UTC).format(&Rfc3339)
}

/// `HH:MM` on a 24-hour clock in the given offset.
pub fn clock_label(ts: OffsetDateTime, offset: UtcOffset) -> String {
    let local = ts.to_offset(offset);
    format!("{:02}:{:02}", local.hour(), local.minute())
}

/// The viewer's UTC offset.
///
/// In the browser this comes from `Date.getTimezoneOffset()`. Elsewhere the
/// process-local offset is used when it can be determined soundly, else UTC.
pub fn local_offset() -> UtcOffset {
    #[cfg(feature = "hydrate")]
    {
        // Minutes *behind* UTC, so the sign is inverted.
        #[allow(clippy::cast_possible_truncation)]
        let minutes = js_sys::Date::new_0().get_timezone_offset() as i32;
        UtcOffset::from_whole_seconds(-minutes * 60).unwrap_or(UtcOffset::UTC)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
    }
}
