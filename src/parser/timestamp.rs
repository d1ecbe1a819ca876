//! Timestamp extraction from raw JSON values

use crate::config::TimestampFormat;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Read a raw value as milliseconds since the epoch (UTC).
///
/// Strings without an offset are taken as UTC.
pub fn parse_timestamp(value: &Value, format: TimestampFormat) -> Result<i64> {
    match (value, format) {
        (Value::Number(n), TimestampFormat::Auto | TimestampFormat::Millis) => {
            if let Some(ms) = n.as_i64() {
                Ok(ms)
            } else {
                n.as_f64().and_then(float_to_millis).ok_or_else(|| {
                    Error::InvalidTimestamp(format!("{} is out of range", n))
                })
            }
        }
        (Value::String(s), TimestampFormat::Millis) => parse_millis(s)
            .ok_or_else(|| Error::InvalidTimestamp(format!("'{}' is not epoch millis", s))),
        (Value::String(s), TimestampFormat::Iso) => parse_iso(s)
            .ok_or_else(|| Error::InvalidTimestamp(format!("'{}' is not an ISO-8601 time", s))),
        (Value::String(s), TimestampFormat::Auto) => parse_millis(s)
            .or_else(|| parse_iso(s))
            .ok_or_else(|| Error::InvalidTimestamp(format!("'{}' is not a recognized time", s))),
        (other, format) => Err(Error::InvalidTimestamp(format!(
            "{} cannot be read as a {} timestamp",
            other,
            format.as_str()
        ))),
    }
}

fn float_to_millis(value: f64) -> Option<i64> {
    if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

fn parse_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(float_to_millis))
}

fn parse_iso(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}
