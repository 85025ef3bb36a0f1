//! Temporal value tuples
//!
//! Every date/time kind shares one shape: seconds since the Unix epoch,
//! nanoseconds in 0..1_000_000_000, and an optional signed zone offset in
//! seconds. DATE values hold midnight seconds with zero nanos; TIME values
//! hold seconds within a day. Ordering and equality are by instant: the zone
//! offset is presentation, not identity.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimestampValue {
    pub seconds: i64,
    pub nanos: u32,
    pub zone: Option<i32>,
}

impl TimestampValue {
    pub fn new(seconds: i64, nanos: u32, zone: Option<i32>) -> Self {
        TimestampValue {
            seconds,
            nanos,
            zone,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        TimestampValue {
            seconds: date.and_time(NaiveTime::MIN).and_utc().timestamp(),
            nanos: 0,
            zone: None,
        }
    }

    pub fn from_datetime(dt: NaiveDateTime, zone: Option<i32>) -> Self {
        TimestampValue {
            seconds: dt.and_utc().timestamp(),
            nanos: dt.nanosecond(),
            zone,
        }
    }

    pub fn from_time(time: NaiveTime, zone: Option<i32>) -> Self {
        TimestampValue {
            seconds: time.num_seconds_from_midnight() as i64,
            nanos: time.nanosecond(),
            zone,
        }
    }

    /// The instant as a chrono datetime, ignoring the zone annotation.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        DateTime::from_timestamp(self.seconds, self.nanos).map(|dt| dt.naive_utc())
    }

    /// The wall-clock datetime after applying the zone offset (or the given
    /// session offset when the value carries none).
    pub fn to_local_naive(&self, session_offset: i32) -> Option<NaiveDateTime> {
        let offset = self.zone.unwrap_or(session_offset);
        DateTime::from_timestamp(self.seconds + offset as i64, self.nanos)
            .map(|dt| dt.naive_utc())
    }

    pub fn to_date(&self) -> Option<NaiveDate> {
        self.to_naive().map(|dt| dt.date())
    }

    /// TIME values: seconds within the day, normalized to 0..86_400.
    pub fn seconds_in_day(&self) -> i64 {
        self.seconds.rem_euclid(SECONDS_PER_DAY)
    }

    pub fn with_zone(&self, zone: Option<i32>) -> Self {
        TimestampValue { zone, ..*self }
    }
}

impl PartialEq for TimestampValue {
    fn eq(&self, other: &Self) -> bool {
        self.seconds == other.seconds && self.nanos == other.nanos
    }
}

impl Eq for TimestampValue {}

impl Ord for TimestampValue {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.seconds, self.nanos).cmp(&(other.seconds, other.nanos))
    }
}

impl PartialOrd for TimestampValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for TimestampValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.seconds.hash(state);
        self.nanos.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 31).unwrap();
        let v = TimestampValue::from_date(date);
        assert_eq!(v.nanos, 0);
        assert_eq!(v.to_date().unwrap(), date);
    }

    #[test]
    fn test_zone_ignored_for_identity() {
        let a = TimestampValue::new(1000, 0, None);
        let b = TimestampValue::new(1000, 0, Some(3600));
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_local_naive_applies_offset() {
        let dt = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        let v = TimestampValue::from_datetime(dt, None);
        let local = v.to_local_naive(3600).unwrap();
        assert_eq!(local.date(), NaiveDate::from_ymd_opt(2021, 6, 2).unwrap());
    }

    #[test]
    fn test_seconds_in_day_wraps_negative() {
        let v = TimestampValue::new(-3600, 0, None);
        assert_eq!(v.seconds_in_day(), SECONDS_PER_DAY - 3600);
    }
}
