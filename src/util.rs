// Parsing and formatting helpers.
//
// Raw exports are messy: prices carry thousands separators, quantities show up
// as `2.0`, and dates come in several layouts. Everything here is forgiving and
// returns `None` rather than failing, so callers can keep the row and carry the
// null forward explicitly.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y"];

fn non_empty(s: Option<&str>) -> Option<&str> {
    let s = s?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parse a price-like value into `f64`.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters (`NaN`, `n/a`, ...).
/// - Strips thousands separators like `","` before parsing.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = non_empty(s)?;
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// Parse an integer column. A float with no fractional part (`3.0`) is
/// accepted since spreadsheet round-trips tend to produce those.
pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let s = non_empty(s)?;
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let v = parse_f64_safe(Some(s))?;
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    parse_i64_safe(s).and_then(|v| i32::try_from(v).ok())
}

pub fn parse_u32_safe(s: Option<&str>) -> Option<u32> {
    parse_i64_safe(s).and_then(|v| u32::try_from(v).ok())
}

/// Parse a date or date-time. Date-only values land on midnight.
pub fn parse_timestamp_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = non_empty(s)?;
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

pub fn non_empty_string(s: Option<String>) -> Option<String> {
    s.and_then(|v| {
        let t = v.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Plain decimal text that always reads back as a float: `100.0`, `2.5`.
pub fn format_decimal(v: f64) -> String {
    let s = v.to_string();
    if !v.is_finite() || s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

/// Sum that skips missing values. An all-null or empty input sums to zero.
pub fn sum_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().sum()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234,567.89`).
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if n.is_sign_negative() && s.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_f64_safe_handles_separators_and_junk() {
        assert_eq!(parse_f64_safe(Some(" 1,250.5 ")), Some(1250.5));
        assert_eq!(parse_f64_safe(Some("NaN")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn test_parse_i64_safe_accepts_whole_floats_only() {
        assert_eq!(parse_i64_safe(Some("7")), Some(7));
        assert_eq!(parse_i64_safe(Some("7.0")), Some(7));
        assert_eq!(parse_i64_safe(Some("7.5")), None);
        assert_eq!(parse_i64_safe(Some("seven")), None);
        assert_eq!(parse_i32_safe(Some("2023.0")), Some(2023));
        assert_eq!(parse_u32_safe(Some("-1")), None);
    }

    #[test]
    fn test_parse_timestamp_safe_supports_known_layouts() {
        let ts = parse_timestamp_safe(Some("2023-01-01")).unwrap();
        assert_eq!((ts.year(), ts.hour()), (2023, 0));

        let ts = parse_timestamp_safe(Some("2022-07-03 14:30:00")).unwrap();
        assert_eq!((ts.year(), ts.hour()), (2022, 14));

        let ts = parse_timestamp_safe(Some("8/23/2022")).unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2022, 8, 23));

        let ts = parse_timestamp_safe(Some("07-03-2022")).unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2022, 7, 3));

        assert_eq!(parse_timestamp_safe(Some("not a date")), None);
        assert_eq!(parse_timestamp_safe(Some("2023-13-45")), None);
    }

    #[test]
    fn test_format_decimal_keeps_a_fraction() {
        assert_eq!(format_decimal(100.0), "100.0");
        assert_eq!(format_decimal(2.5), "2.5");
        assert_eq!(format_decimal(-3.0), "-3.0");
        assert_eq!(format_decimal(1e20), "100000000000000000000.0");
        assert_eq!(parse_f64_safe(Some(&format_decimal(0.1))), Some(0.1));
    }

    #[test]
    fn test_sum_present_skips_nulls() {
        assert_eq!(sum_present(vec![Some(1.5), None, Some(2.5)]), 4.0);
        assert_eq!(sum_present(Vec::<Option<f64>>::new()), 0.0);
    }

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(4000.4, 0), "4,000");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_number(-0.2, 0), "0");
        assert_eq!(format_int(9855usize), "9,855");
    }
}
