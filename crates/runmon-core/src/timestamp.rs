//! Wire format for backend timestamps.
//!
//! The backend emits ISO-8601 strings, sometimes without an offset (those are
//! UTC), and older fixtures carry plain Unix seconds. Outgoing timestamps are
//! always RFC 3339 with millisecond precision.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimestampError {
    #[error("unrecognized timestamp '{raw}'")]
    Unrecognized { raw: String },
    #[error("timestamp out of range: {seconds}")]
    OutOfRange { seconds: f64 },
}

/// The watermark used before anything has been received.
pub fn epoch() -> DateTime<Utc> {
    // `DateTime<Utc>::default()` is the Unix epoch.
    DateTime::<Utc>::default()
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(TimestampError::Unrecognized {
        raw: raw.to_string(),
    })
}

pub fn from_unix_seconds(seconds: f64) -> Result<DateTime<Utc>, TimestampError> {
    if !seconds.is_finite() {
        return Err(TimestampError::OutOfRange { seconds });
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1_000_000_000.0).round() as u32;
    DateTime::<Utc>::from_timestamp(whole as i64, nanos.min(999_999_999))
        .ok_or(TimestampError::OutOfRange { seconds })
}

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(TimestampVisitor)
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = DateTime<Utc>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an ISO-8601 timestamp or Unix seconds")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        parse_timestamp(value).map_err(E::custom)
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        DateTime::<Utc>::from_timestamp(value, 0).ok_or_else(|| {
            E::custom(TimestampError::OutOfRange {
                seconds: value as f64,
            })
        })
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let seconds = i64::try_from(value).map_err(|_| {
            E::custom(TimestampError::OutOfRange {
                seconds: value as f64,
            })
        })?;
        self.visit_i64(seconds)
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        from_unix_seconds(value).map_err(E::custom)
    }
}
