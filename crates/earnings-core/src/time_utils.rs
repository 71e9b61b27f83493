use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone as _, Timelike as _};
use chrono_tz::Tz;
use regex::Regex;
use tracing::warn;

use crate::error::{EarningsError, Result};

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Parse an IANA timezone name.
pub fn parse_timezone(tz_name: &str) -> Result<Tz> {
    tz_name
        .parse::<Tz>()
        .map_err(|_| EarningsError::InvalidTimezone(tz_name.to_string()))
}

/// Resolve an IANA timezone name, falling back to UTC with a warning.
pub fn resolve_timezone(tz_name: &str) -> Tz {
    parse_timezone(tz_name).unwrap_or_else(|err| {
        warn!("{}, falling back to UTC", err);
        Tz::UTC
    })
}

// ── DateTimeParser ────────────────────────────────────────────────────────────

fn glued_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})(\d{1,2}:\d{2})").expect("regex is valid"))
}

fn datetime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([a-z]{3})\s+(\d{1,2}),\s*(\d{4}),?\s*(\d{1,2}):(\d{2})\s*(am|pm)")
            .expect("regex is valid")
    })
}

/// Three-letter month abbreviation, English or Spanish, to month number.
fn month_from_abbrev(abbrev: &str) -> Option<u32> {
    let month = match abbrev.to_ascii_lowercase().as_str() {
        "jan" | "ene" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" | "abr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" | "ago" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" | "dic" => 12,
        _ => return None,
    };
    Some(month)
}

/// Convert a 12-hour clock reading to 0–23.
///
/// `12am` is hour 0, `12pm` stays 12, any other `pm` hour gains 12. The
/// result is not range-checked here.
pub fn to_24_hour(hour: u32, is_pm: bool) -> u32 {
    match (hour, is_pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    }
}

/// Extracts timestamps from export fragments like `"Mar 14, 2024, 3:45pm"`.
///
/// Export times carry no offset, so they are read as wall-clock time in the
/// parser's timezone.
#[derive(Debug, Clone, Copy)]
pub struct DateTimeParser {
    tz: Tz,
}

impl DateTimeParser {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse `text` into epoch milliseconds (UTC).
    ///
    /// Returns `None` when no `Mon D, YYYY, H:MM am|pm` pattern is present,
    /// the fields do not form a real calendar date and clock time, or the
    /// local time does not exist (DST gap). Ambiguous local times resolve to
    /// the earliest instant.
    pub fn parse(&self, text: &str) -> Option<i64> {
        let naive = parse_naive(text)?;
        let local = self.tz.from_local_datetime(&naive).earliest()?;
        Some(local.timestamp_millis())
    }
}

/// The naive (offset-free) date and time found in `text`.
pub fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    let normalized = glued_year_re().replace_all(text, "${1} ${2}");
    let caps = datetime_re().captures(&normalized)?;

    let month = month_from_abbrev(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;
    let is_pm = caps[6].eq_ignore_ascii_case("pm");

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(to_24_hour(hour, is_pm), minute, 0)?;
    Some(NaiveDateTime::new(date, time))
}

// ── Hour truncation ───────────────────────────────────────────────────────────

/// Truncate `timestamp_ms` to the start of its hour in `tz`.
///
/// Minutes, seconds and milliseconds of the local reading are zeroed, so
/// zones with half-hour offsets bucket on local hours.
pub fn start_of_hour(timestamp_ms: i64, tz: Tz) -> i64 {
    let Some(utc) = chrono::DateTime::from_timestamp_millis(timestamp_ms) else {
        return timestamp_ms;
    };
    let local = utc.with_timezone(&tz);
    let into_hour = i64::from(local.minute()) * 60_000
        + i64::from(local.second()) * 1_000
        + i64::from(local.timestamp_subsec_millis());
    timestamp_ms - into_hour
}

// ── Tests ──────────────────────────────────────────────────────────────────────
