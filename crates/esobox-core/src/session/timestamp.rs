use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session creation time as carried on the wire: milliseconds since the
/// Unix epoch in a 64-bit float.
///
/// Any float is accepted from a token, so the value is not guaranteed to be
/// a representable date.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis() as f64)
    }

    pub fn millis(&self) -> f64 {
        self.0
    }

    /// The timestamp as a date, if it names one.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if !self.0.is_finite() || self.0.abs() > i64::MAX as f64 {
            return None;
        }
        Utc.timestamp_millis_opt(self.0 as i64).single()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp_millis() as f64)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(date) => write!(f, "{}", date.to_rfc3339()),
            None => write!(f, "{}", self.0),
        }
    }
}
