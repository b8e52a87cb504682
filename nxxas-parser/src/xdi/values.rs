//! Header value inference
//!
//! An XDI header value is plain text. It is typed by trying, in order:
//!
//!     1. dimensionless integer      `# Scan.points: 421`
//!     2. dimensionless decimal      `# Mono.d_spacing: 3.13555`
//!     3. ISO-8601 timestamp         `# Scan.start_time: 2001-06-26T21:21:20`
//!     4. number followed by a unit  `# Facility.energy: 7.00 GeV`
//!     5. raw text                   `# Detector.I0: 10cm  N2`
//!
//! The first match wins. A number followed by something that is not a known
//! unit falls through to raw text.

use super::record::FieldValue;
use crate::units::UnitValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?\s+\S").expect("valid regex")
});

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Type a raw header value.
pub fn infer_value(raw: &str) -> FieldValue {
    let raw = raw.trim();

    if let Ok(integer) = raw.parse::<i64>() {
        return FieldValue::Quantity(UnitValue::from(integer));
    }
    if let Ok(decimal) = raw.parse::<f64>() {
        return FieldValue::Quantity(UnitValue::from(decimal));
    }
    if let Some(timestamp) = parse_timestamp(raw) {
        return FieldValue::Timestamp(timestamp);
    }
    if NUMBER_WITH_UNIT.is_match(raw) {
        if let Ok(quantity) = raw.parse::<UnitValue>() {
            return FieldValue::Quantity(quantity);
        }
    }
    FieldValue::Text(raw.to_string())
}

/// Parse an ISO-8601 date or date-time. Offsets are folded into local time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(zoned) = DateTime::parse_from_rfc3339(raw) {
        return Some(zoned.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(timestamp);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
