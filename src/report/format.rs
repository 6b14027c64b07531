//! Number and timestamp formatting for the report.
//!
//! Kept separate from the HTML assembly so the exact textual forms are easy to test.

use chrono::NaiveDateTime;

/// Sign-prefixed integer, e.g. `+500`, `-1200`, `+0`.
pub fn fmt_signed_int(v: f64) -> String {
    // -0.0 is classified as an injection, so it prints as +0.
    let v = if v == 0.0 { 0.0 } else { v };
    format!("{v:+.0}")
}

/// Rate with three decimals and a percent sign, e.g. `1.850%`.
pub fn fmt_rate(v: f64) -> String {
    format!("{v:.3}%")
}

/// Wall-clock generation time as `YYYY-MM-DD HH:MM:SS`.
pub fn fmt_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn signed_int_formats() {
        assert_eq!(fmt_signed_int(500.0), "+500");
        assert_eq!(fmt_signed_int(-1200.4), "-1200");
        assert_eq!(fmt_signed_int(0.0), "+0");
        assert_eq!(fmt_signed_int(-0.0), "+0");
        assert_eq!(fmt_signed_int(-0.3), "-0");
        assert_eq!(fmt_signed_int(250.0), "+250");
    }

    #[test]
    fn rate_formats() {
        assert_eq!(fmt_rate(1.85), "1.850%");
        assert_eq!(fmt_rate(1.8512), "1.851%");
    }

    #[test]
    fn timestamp_formats() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap();
        assert_eq!(fmt_timestamp(ts), "2024-01-02 09:05:07");
    }
}
