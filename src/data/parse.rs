//! Lenient scalar parsing shared by the adapters.

use chrono::NaiveDate;
use serde_json::Value;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Parse a calendar date, dropping any time-of-day suffix.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }

    // `2024-01-02 00:00:00` / `2024-01-02T00:00:00`
    let head = trimmed.get(..10)?;
    let rest = &trimmed[10..];
    if rest.starts_with(' ') || rest.starts_with('T') {
        return NaiveDate::parse_from_str(head, "%Y-%m-%d").ok();
    }
    None
}

/// Parse a numeric cell; placeholders like `-` or `--` are not numbers.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches('%')
        .trim_end()
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '-') {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Numeric value from a JSON number or numeric string.
pub fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Date from a JSON string field.
pub fn json_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => n.as_u64().and_then(|v| parse_date(&v.to_string())),
        _ => None,
    }
}
