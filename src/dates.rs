use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// ISO-8601 calendar date format used on the wire and in file names.
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Parses a calendar date, accepting plain `YYYY-MM-DD` as well as full
/// timestamps (the time part is dropped). Anything else yields `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, ISO_DATE) {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ts| ts.date())
}

/// Coerces a JSON cell into a date; non-strings and malformed strings are missing.
pub fn date_from_value(value: &Value) -> Option<NaiveDate> {
    value.as_str().and_then(parse_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(parse_date("2023-01-15"), Some(ymd(2023, 1, 15)));
        assert_eq!(parse_date(" 2023-01-15 "), Some(ymd(2023, 1, 15)));
    }

    #[test]
    fn test_parse_timestamps_keep_date_part() {
        assert_eq!(parse_date("2023-01-15T10:30:00Z"), Some(ymd(2023, 1, 15)));
        assert_eq!(parse_date("2023-01-15T10:30:00"), Some(ymd(2023, 1, 15)));
        assert_eq!(parse_date("2023-01-15 00:00:00"), Some(ymd(2023, 1, 15)));
    }

    #[test]
    fn test_malformed_dates_are_missing() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not-a-date"), None);
        assert_eq!(parse_date("2023-13-45"), None);
        assert_eq!(date_from_value(&json!(20230115)), None);
        assert_eq!(date_from_value(&Value::Null), None);
    }
}
