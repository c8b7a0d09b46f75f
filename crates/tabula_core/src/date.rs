//! Calendar-day ranges and lenient date parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format used when dates leave the controller (URL state, request params).
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Formats accepted when reading dates back, tried in order after RFC 3339.
const FALLBACK_FORMATS: &[&str] = &[DAY_FORMAT, "%m/%d/%Y", "%b %d, %Y", "%b %e, %Y"];

/// Inclusive range of calendar days. Either bound may be open.
///
/// When both bounds are present `from <= to` always holds: constructors swap
/// reversed bounds rather than rejecting them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DateRange {
    /// Builds a range, swapping the bounds if they arrive reversed.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        match (from, to) {
            (Some(f), Some(t)) if f > t => {
                tracing::debug!(from = %f, to = %t, "Swapping reversed date range bounds");
                Self {
                    from: Some(t),
                    to: Some(f),
                }
            }
            _ => Self { from, to },
        }
    }

    /// A closed range over two days.
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self::new(Some(from), Some(to))
    }

    /// Range with both bounds open.
    pub fn cleared() -> Self {
        Self::default()
    }

    /// Lower bound.
    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    /// Upper bound.
    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    /// Both bounds absent.
    pub fn is_cleared(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Both bounds present.
    pub fn is_complete(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    /// Whether `day` falls inside the range. Open bounds match everything.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.is_none_or(|f| day >= f) && self.to.is_none_or(|t| day <= t)
    }

    /// Lower bound as `YYYY-MM-DD`.
    pub fn from_day_string(&self) -> Option<String> {
        self.from.map(format_day)
    }

    /// Upper bound as `YYYY-MM-DD`.
    pub fn to_day_string(&self) -> Option<String> {
        self.to.map(format_day)
    }
}

/// Formats a day as `YYYY-MM-DD`.
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Parses a date leniently.
///
/// Accepts RFC 3339 timestamps, naive ISO timestamps, `YYYY-MM-DD`,
/// `MM/DD/YYYY` and `Mon DD, YYYY`. A `+` is read as a space, as happens
/// when a form-encoded value is decoded twice. Returns `None` for anything
/// else.
///
/// # Examples
///
/// ```
/// use tabula_core::parse_day;
///
/// let day = parse_day("Dec+13,+2025").unwrap();
/// assert_eq!(day.to_string(), "2025-12-13");
/// assert!(parse_day("yesterday").is_none());
/// ```
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Offsets use '+', so timestamps are tried before '+' becomes a space.
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(stamp.date_naive());
    }

    let text = trimmed.replace('+', " ");
    if let Ok(stamp) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(stamp.date());
    }

    let parsed = FALLBACK_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&text, format).ok());
    if parsed.is_none() {
        tracing::debug!(raw, "Date did not match any supported format");
    }
    parsed
}
