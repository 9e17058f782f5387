//! End-of-life timestamps as stored by upstream ingestion.
//!
//! Ingestion writes end-of-life values as text, sometimes with a UTC marker
//! or numeric offset and sometimes as a bare wall-clock value in server
//! local time. [`EndOfLife::parse`] turns the text into an explicit tagged
//! value once, at the storage boundary.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

/// Pattern recognising an absolute (UTC-qualified) timestamp string.
///
/// A time-of-day followed by `Z` or a `±HH:MM` / `±HHMM` offset. Written in
/// the subset shared by the `regex` crate and PostgreSQL ARE so the store
/// can classify rows with the same rule.
pub const UTC_QUALIFIED_PATTERN: &str =
    r"[T ][0-9]{2}:[0-9]{2}(:[0-9]{2}(\.[0-9]+)?)? ?([Zz]|[+-][0-9]{2}:?[0-9]{2})$";

static UTC_QUALIFIED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(UTC_QUALIFIED_PATTERN).expect("valid regex"));

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// An end-of-life instant with its time-interpretation rule made explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfLife {
    /// Absolute instant (the source carried `Z` or an offset).
    Utc(DateTime<Utc>),
    /// Wall-clock value in server local time with no zone information.
    Local(NaiveDateTime),
}

impl EndOfLife {
    /// Parse a stored end-of-life string.
    ///
    /// Accepts ISO-8601 style values with `T` or a space between date and
    /// time, optional seconds and fraction. A bare date is read as local
    /// midnight. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if is_utc_qualified(raw) {
            parse_qualified(raw).map(EndOfLife::Utc)
        } else {
            parse_naive(raw).map(EndOfLife::Local)
        }
    }

    /// Whether this value follows the UTC rule.
    pub fn is_utc(&self) -> bool {
        matches!(self, EndOfLife::Utc(_))
    }
}

impl fmt::Display for EndOfLife {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndOfLife::Utc(instant) => write!(f, "{}", instant.to_rfc3339()),
            EndOfLife::Local(naive) => write!(f, "{} (local)", naive.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

/// Whether `raw` carries a UTC marker or numeric offset.
pub fn is_utc_qualified(raw: &str) -> bool {
    UTC_QUALIFIED_RE.is_match(raw.trim())
}

/// Replace a space date/time separator with `T` and drop a space before
/// the zone designator.
fn normalize(raw: &str) -> String {
    let mut s = raw.to_string();
    if s.len() > 10 && s.is_char_boundary(10) && s.is_char_boundary(11) && &s[10..11] == " " {
        s.replace_range(10..11, "T");
    }
    if let Some(pos) = s.rfind(' ') {
        if pos > 10 {
            s.remove(pos);
        }
    }
    s
}

fn parse_qualified(raw: &str) -> Option<DateTime<Utc>> {
    let mut s = normalize(raw);
    if s.ends_with(['Z', 'z']) {
        s.pop();
        s.push_str("+00:00");
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&s, fmt).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    let s = normalize(raw);
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{NaiveDate, TimeZone};

    use super::*;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn zulu_suffix_is_utc() {
        let eol = EndOfLife::parse("2026-10-01T20:30:00.000Z").unwrap();
        assert_eq!(
            eol,
            EndOfLife::Utc(Utc.with_ymd_and_hms(2026, 10, 1, 20, 30, 0).unwrap())
        );
        assert!(eol.is_utc());
    }

    #[test]
    fn numeric_offset_is_normalised_to_utc() {
        let eol = EndOfLife::parse("2026-10-01 22:30:00+02:00").unwrap();
        assert_eq!(
            eol,
            EndOfLife::Utc(Utc.with_ymd_and_hms(2026, 10, 1, 20, 30, 0).unwrap())
        );
        let compact = EndOfLife::parse("2026-10-01T15:30-0500").unwrap();
        assert_eq!(
            compact,
            EndOfLife::Utc(Utc.with_ymd_and_hms(2026, 10, 1, 20, 30, 0).unwrap())
        );
    }

    #[test]
    fn naive_values_are_local() {
        assert_eq!(
            EndOfLife::parse("2026-10-01T20:30:00").unwrap(),
            EndOfLife::Local(naive(2026, 10, 1, 20, 30, 0))
        );
        assert_eq!(
            EndOfLife::parse("2026-10-01 20:30").unwrap(),
            EndOfLife::Local(naive(2026, 10, 1, 20, 30, 0))
        );
        assert_eq!(
            EndOfLife::parse("2026-10-01").unwrap(),
            EndOfLife::Local(naive(2026, 10, 1, 0, 0, 0))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_matches!(EndOfLife::parse(""), None);
        assert_matches!(EndOfLife::parse("next friday"), None);
        assert_matches!(EndOfLife::parse("2026-13-45T10:00:00Z"), None);
        assert_matches!(EndOfLife::parse("2026-02-30"), None);
    }

    #[test]
    fn classification_does_not_mistake_dates_for_offsets() {
        assert!(!is_utc_qualified("2026-01-01"));
        assert!(!is_utc_qualified("2026-01-01T10:00:00"));
        assert!(!is_utc_qualified("2026-01-01 10:00"));
        assert!(is_utc_qualified("2026-01-01T10:00:00Z"));
        assert!(is_utc_qualified("2026-01-01 10:00 Z"));
        assert!(is_utc_qualified("2026-01-01T10:00:00.123-05:00"));
    }

    #[test]
    fn display_marks_local_values() {
        let local = EndOfLife::parse("2026-10-01 20:30:00").unwrap();
        assert_eq!(local.to_string(), "2026-10-01T20:30:00 (local)");
    }
}
