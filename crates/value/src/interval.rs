//! Interval values
//!
//! An interval is either a signed month count (the YEAR/MONTH family) or a
//! signed seconds/nanoseconds pair (the DAY..SECOND family). The two families
//! never mix; the type system rejects cross-family operations before they
//! reach this representation.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntervalValue {
    /// YEAR/MONTH family: total signed months.
    Months(i64),
    /// DAY..SECOND family: total signed seconds plus nanoseconds. The nanos
    /// carry the same sign as the seconds; `from_total_nanos` maintains this.
    Seconds { seconds: i64, nanos: i32 },
}

impl IntervalValue {
    pub fn from_total_nanos(total: i128) -> Option<IntervalValue> {
        let seconds = i64::try_from(total / NANOS_PER_SECOND as i128).ok()?;
        let nanos = (total % NANOS_PER_SECOND as i128) as i32;
        Some(IntervalValue::Seconds { seconds, nanos })
    }

    pub fn total_nanos(&self) -> Option<i128> {
        match self {
            IntervalValue::Months(_) => None,
            IntervalValue::Seconds { seconds, nanos } => {
                Some(*seconds as i128 * NANOS_PER_SECOND as i128 + *nanos as i128)
            }
        }
    }

    pub fn months(&self) -> Option<i64> {
        match self {
            IntervalValue::Months(m) => Some(*m),
            IntervalValue::Seconds { .. } => None,
        }
    }

    pub fn is_year_month(&self) -> bool {
        matches!(self, IntervalValue::Months(_))
    }

    /// Same-family checked addition; `None` on family mismatch or overflow.
    pub fn checked_add(&self, other: &IntervalValue) -> Option<IntervalValue> {
        match (self, other) {
            (IntervalValue::Months(a), IntervalValue::Months(b)) => {
                a.checked_add(*b).map(IntervalValue::Months)
            }
            (IntervalValue::Seconds { .. }, IntervalValue::Seconds { .. }) => {
                IntervalValue::from_total_nanos(self.total_nanos()? + other.total_nanos()?)
            }
            _ => None,
        }
    }

    pub fn checked_sub(&self, other: &IntervalValue) -> Option<IntervalValue> {
        other.checked_neg().and_then(|n| self.checked_add(&n))
    }

    pub fn checked_neg(&self) -> Option<IntervalValue> {
        match self {
            IntervalValue::Months(m) => m.checked_neg().map(IntervalValue::Months),
            IntervalValue::Seconds { .. } => {
                IntervalValue::from_total_nanos(-self.total_nanos()?)
            }
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            IntervalValue::Months(m) => *m < 0,
            IntervalValue::Seconds { seconds, nanos } => *seconds < 0 || *nanos < 0,
        }
    }
}

impl fmt::Display for IntervalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalValue::Months(m) => write!(f, "{} months", m),
            IntervalValue::Seconds { seconds, nanos } => {
                if *nanos == 0 {
                    write!(f, "{} seconds", seconds)
                } else {
                    write!(f, "{}.{:09} seconds", seconds, nanos.unsigned_abs())
                }
            }
        }
    }
}
