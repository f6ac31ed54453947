use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use regex::Regex;
use tracing::debug;

// ── Report dates from file names ──────────────────────────────────────────────

fn report_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\((\d{4}-\d{2}-\d{2})").expect("regex is valid"))
}

/// Extract the report date from a source file name.
///
/// Exports are named like `List Avance Obra (2024-01-15 06_00).xlsx`; the
/// first `(YYYY-MM-DD` occurrence is the date. Returns `None` when the
/// pattern is absent or the digits do not form a real calendar date.
pub fn extract_report_date(file_name: &str) -> Option<NaiveDate> {
    let caps = report_date_pattern().captures(file_name)?;
    let date = parse_iso_date(&caps[1]);
    if date.is_none() {
        debug!("file name {} carries an invalid date {}", file_name, &caps[1]);
    }
    date
}

// ── Parsing / formatting ──────────────────────────────────────────────────────

/// Parse a strict `YYYY-MM-DD` string.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parse a date cell rendered as text. Accepts plain dates and the
/// date-time renderings spreadsheets produce for date cells.
pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Some(date) = parse_iso_date(s) {
        return Some(date);
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}

/// Convert an Excel serial day number (1900 date system) into a date.
///
/// Returns `None` for serials outside chrono's date range.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    // Serial 1 is 1900-01-01, but Excel counts a phantom 1900-02-29, so
    // anchoring on 1899-12-30 is exact for every date after February 1900.
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

/// Month key of a date, formatted `YYYY-MM`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Validate a `YYYY-MM` month key. Returns the normalised key.
pub fn parse_month_key(s: &str) -> Option<String> {
    let first_day = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d").ok()?;
    Some(month_key(first_day))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
