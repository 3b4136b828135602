//! Source tracker timestamps.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Format used by the issue detail pages (`title` attribute of `.date`).
pub const SOURCE_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Format used when showing dates in migrated text.
pub const HUMAN_DATE_FORMAT: &str = "%B %d, %Y %H:%M:%S";

/// Parse a scraped timestamp.
///
/// Accepts the detail-page format, RFC 3339, and Unix seconds (the CSV export's
/// `OpenedTimestamp` column). Detail-page dates carry no zone and are taken as
/// UTC.
#[must_use]
pub fn parse_source_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, SOURCE_DATE_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Render a scraped timestamp for display, passing unparsable input through.
#[must_use]
pub fn human_date(raw: &str) -> String {
    parse_source_date(raw).map_or_else(
        || raw.to_string(),
        |parsed| parsed.format(HUMAN_DATE_FORMAT).to_string(),
    )
}
