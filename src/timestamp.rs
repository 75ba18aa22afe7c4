//! Conversion of `WARC-Date` values into 14-digit index timestamps.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Width of an index timestamp (`YYYYMMDDHHMMSS`).
pub const TIMESTAMP_LEN: usize = 14;

/// Convert an ISO 8601 date (`2017-03-06T04:02:06Z`) to `20170306040206`.
///
/// Offsets are normalized to UTC and fractional seconds are dropped. Values
/// chrono cannot parse are handled leniently: their digits are taken in
/// order, truncated to 14 and right-padded with zeros, so `2014-04` becomes
/// `20140400000000`.
pub fn iso_date_to_timestamp(date: &str) -> String {
    let date = date.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(date) {
        return parsed.with_timezone(&Utc).format("%Y%m%d%H%M%S").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S") {
        return parsed.format("%Y%m%d%H%M%S").to_string();
    }

    let mut digits: String = date
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(TIMESTAMP_LEN)
        .collect();
    while digits.len() < TIMESTAMP_LEN {
        digits.push('0');
    }
    digits
}
