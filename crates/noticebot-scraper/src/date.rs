//! Notice date parsing.

use chrono::NaiveDate;

/// Tried in order. The board prints "October 22, 2025"; the abbreviated
/// form shows up on older rows.
const NOTICE_DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y"];

/// Parse a raw date cell into a calendar date. `None` when no format fits.
pub fn parse_notice_date(raw: &str) -> Option<NaiveDate> {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return None;
    }
    let parsed = NOTICE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok());
    if parsed.is_none() {
        tracing::debug!("Could not parse notice date: {raw:?}");
    }
    parsed
}
