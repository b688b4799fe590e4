//! Timestamp encoding for persisted records.
//!
//! Records are written as `YYYY-MM-DDTHH:MM:SS`. Reading also accepts the
//! space-separated form, the 12-hour `AM`/`PM` form, fractional seconds,
//! and bare dates (midnight), all of which occur in older data files.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

/// Format used when writing timestamps.
pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const ACCEPTED: &[&str] = &[
    FORMAT,
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%I:%M:%S %p",
    "%Y-%m-%d %I:%M:%S %p",
];

/// Parse a timestamp in any accepted layout.
#[must_use]
pub fn parse(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    ACCEPTED
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Render a timestamp in the canonical layout.
#[must_use]
pub fn format(value: &NaiveDateTime) -> String {
    value.format(FORMAT).to_string()
}

/// Serde `serialize_with` hook.
pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(value))
}

/// Serde `deserialize_with` hook.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}
