//! Wall-clock seam and the millisecond-precision timestamp used on the wire.

use core::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// UTC instant truncated to whole milliseconds.
///
/// Serializes as an ISO-8601 string with exactly three fractional digits and a
/// `Z` suffix, e.g. `2024-01-02T03:04:05.678Z`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value.trunc_subsecs(3))
    }

    /// Unix time in whole seconds.
    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn to_iso_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_datetime(value)
    }
}

impl core::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

impl FromStr for Timestamp {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = DateTime::parse_from_rfc3339(s)
            .map_err(|e| DomainError::invalid_timestamp(format!("{s}: {e}")))?;
        Ok(Self::from_datetime(parsed.with_timezone(&Utc)))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Source of "now".
///
/// Handlers take a clock explicitly so tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

impl<C> Clock for std::sync::Arc<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Clock backed by the system time.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(Utc::now())
    }
}

/// Clock that always reports the same instant until moved with `set`.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(instant: Timestamp) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    pub fn set(&self, instant: Timestamp) {
        match self.instant.lock() {
            Ok(mut guard) => *guard = instant,
            Err(poisoned) => *poisoned.into_inner() = instant,
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        match self.instant.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> Timestamp {
        "2024-03-01T12:30:45.123Z".parse().unwrap()
    }

    #[test]
    fn serializes_with_millisecond_precision_and_z_suffix() {
        let json = serde_json::to_value(t0()).unwrap();
        assert_eq!(json, serde_json::json!("2024-03-01T12:30:45.123Z"));
    }

    #[test]
    fn truncates_sub_millisecond_precision() {
        let dt = Utc
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 45)
            .unwrap()
            .checked_add_signed(chrono::Duration::microseconds(123_456))
            .unwrap();
        assert_eq!(Timestamp::from_datetime(dt).to_iso_string(), "2024-03-01T12:30:45.123Z");
    }

    #[test]
    fn whole_seconds_still_render_three_digits() {
        let ts: Timestamp = "2024-03-01T00:00:00Z".parse().unwrap();
        assert_eq!(ts.to_string(), "2024-03-01T00:00:00.000Z");
    }

    #[test]
    fn parses_offsets_into_utc() {
        let ts: Timestamp = "2024-03-01T14:30:45.123+02:00".parse().unwrap();
        assert_eq!(ts, t0());
    }

    #[test]
    fn rejects_garbage() {
        let err = "yesterday".parse::<Timestamp>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidTimestamp(_)));
    }

    #[test]
    fn fixed_clock_is_stable_until_set() {
        let clock = FixedClock::new(t0());
        assert_eq!(clock.now(), t0());
        assert_eq!(clock.now(), t0());

        let later: Timestamp = "2025-01-01T00:00:00.000Z".parse().unwrap();
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
