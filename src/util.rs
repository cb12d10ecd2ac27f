// Utility helpers for parsing, normalization and number formatting.
//
// This module centralizes all the "dirty" CSV/number/date/region-name handling
// so the rest of the code can assume clean, typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Key of the national aggregate in every regional dataset.
pub const NATIONAL_KEY: &str = "ITALIA";

/// Known spellings that survive the basic normalization but must still join
/// with the canonical key used by the other datasets. Keys are already
/// normalized (upper-case, single-spaced, no hyphens).
static REGION_EXCEPTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("VALLE D'AOSTA/VALLÉE D'AOSTE", "VALLE D'AOSTA"),
        ("VALLE D'AOSTA / VALLÉE D'AOSTE", "VALLE D'AOSTA"),
        ("VALLE D'AOSTA/VALLEE D'AOSTE", "VALLE D'AOSTA"),
        ("VALLÉE D'AOSTE", "VALLE D'AOSTA"),
        ("VALLE D’AOSTA", "VALLE D'AOSTA"),
        ("TRENTINO ALTO ADIGE/SÜDTIROL", "TRENTINO ALTO ADIGE"),
        ("TRENTINO ALTO ADIGE / SÜDTIROL", "TRENTINO ALTO ADIGE"),
        ("TRENTINO ALTO ADIGE/SUDTIROL", "TRENTINO ALTO ADIGE"),
        ("TRENTINO SÜDTIROL", "TRENTINO ALTO ADIGE"),
        ("FRIULI V.G.", "FRIULI VENEZIA GIULIA"),
    ])
});

/// Canonical join key for a region name.
///
/// - Trims and upper-cases.
/// - Turns hyphens into spaces and collapses runs of whitespace.
/// - Maps the few known mismatching spellings through `REGION_EXCEPTIONS`.
///
/// Idempotent: normalizing a canonical key returns it unchanged.
pub fn normalize_region_name(name: &str) -> String {
    let upper = name.to_uppercase().replace('-', " ");
    let collapsed = upper.split_whitespace().collect::<Vec<_>>().join(" ");
    match REGION_EXCEPTIONS.get(collapsed.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => collapsed,
    }
}

/// Parse a numeric CSV cell that may use Italian formatting.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Drops every whitespace character, including the no-break and thin
///   spaces used as thousands separators.
/// - When a comma is present it is the decimal mark and dots are grouping
///   (`"1.234,56"` -> `1234.56`).
/// - Rejects values that contain alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed, never `NaN`.
pub fn parse_number(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let canonical = if compact.contains(',') {
        compact.replace('.', "").replace(',', ".")
    } else {
        compact
    };
    canonical.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i32>().ok()
}

/// Turn a `D/M/YYYY` date into ISO `YYYY-MM-DD`.
///
/// ISO dates and anything that is not a valid day/month/year triple pass
/// through unchanged (trimmed), so an ambiguous value is never misread.
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains('/') {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    raw.to_string()
}

pub fn average(v: &[f64]) -> f64 {
    // 0 for an empty slice, never NaN.
    match v.len() {
        0 => 0.0,
        n => v.iter().sum::<f64>() / n as f64,
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Italian grouping: `1.234.567,89`. The integer part goes through
    // `num-format`, the fraction is appended after a comma.
    let s = format!("{:.*}", decimals, n.abs());
    let neg = n < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::it);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push(',');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Italian thousands grouping for counts (`9.855`).
pub fn format_int(n: impl ToFormattedString) -> String {
    n.to_formatted_string(&Locale::it)
}

/// `format_number` for optional values, with the "N/D" placeholder the
/// presentation layer shows for missing data.
pub fn format_opt(n: Option<f64>, decimals: usize) -> String {
    match n {
        Some(v) => format_number(v, decimals),
        None => "N/D".to_string(),
    }
}
