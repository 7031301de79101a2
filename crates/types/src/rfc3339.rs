//! Serde helpers rendering Unix seconds as RFC 3339 UTC timestamps.
//!
//! `1_680_000_000` is written as `"2023-03-28T10:40:00Z"`. Reading accepts any RFC 3339 offset
//! and converts it back to Unix seconds.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer, de, ser};

/// Formats `secs` as an RFC 3339 UTC timestamp with second precision.
pub fn format(secs: u64) -> Option<String> {
    let secs = i64::try_from(secs).ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Serializes Unix seconds as an RFC 3339 string.
pub fn serialize<S: Serializer>(secs: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    let formatted = format(*secs)
        .ok_or_else(|| ser::Error::custom(format_args!("timestamp {secs} is out of range")))?;
    serializer.serialize_str(&formatted)
}

/// Deserializes an RFC 3339 string into Unix seconds.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let time = DateTime::parse_from_rfc3339(&raw).map_err(de::Error::custom)?;
    u64::try_from(time.timestamp())
        .map_err(|_| de::Error::custom(format_args!("timestamp {raw} is before 1970")))
}
