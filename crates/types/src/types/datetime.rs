//! Datetime kernel
//!
//! DATE, TIME and TIMESTAMP, each with or without a zone offset. Values
//! without a zone hold local wall-clock seconds; values with a zone hold the
//! UTC instant plus the offset they were written in. Converting between the
//! two shifts by the session's zone offset. chrono does the calendar math.

use super::data_type::SqlType;
use super::value::Value;
use crate::error::{CastWarning, Error, Result};
use crate::session::SessionContext;
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use silica_value::{IntervalValue, SECONDS_PER_DAY, TimestampValue};
use std::cmp::Ordering;

/// Fields addressable by EXTRACT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    DayOfWeek,
    IsoDayOfWeek,
    DayOfYear,
    WeekOfYear,
    Quarter,
    TimezoneHour,
    TimezoneMinute,
    SecondsSinceEpoch,
}

impl DateTimePart {
    pub fn name(&self) -> &'static str {
        match self {
            DateTimePart::Year => "YEAR",
            DateTimePart::Month => "MONTH",
            DateTimePart::Day => "DAY",
            DateTimePart::Hour => "HOUR",
            DateTimePart::Minute => "MINUTE",
            DateTimePart::Second => "SECOND",
            DateTimePart::DayOfWeek => "DAY_OF_WEEK",
            DateTimePart::IsoDayOfWeek => "ISO_DAY_OF_WEEK",
            DateTimePart::DayOfYear => "DAY_OF_YEAR",
            DateTimePart::WeekOfYear => "WEEK_OF_YEAR",
            DateTimePart::Quarter => "QUARTER",
            DateTimePart::TimezoneHour => "TIMEZONE_HOUR",
            DateTimePart::TimezoneMinute => "TIMEZONE_MINUTE",
            DateTimePart::SecondsSinceEpoch => "SECONDS_SINCE_EPOCH",
        }
    }
}

pub fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    Ok(require_ts(a)?.cmp(require_ts(b)?))
}

/// Widest of two datetime types. DATE and TIME have no common supertype;
/// TIMESTAMP absorbs both.
pub fn get_aggregate_type(left: &SqlType, right: &SqlType) -> Result<SqlType> {
    if left == right {
        return Ok(left.clone());
    }
    let mismatch = || Error::IncompatibleTypes {
        left: left.name().to_string(),
        right: right.name().to_string(),
    };
    match (left, right) {
        (SqlType::Date, SqlType::Date) => Ok(SqlType::Date),
        (
            SqlType::Time { scale: s1, with_zone: z1 },
            SqlType::Time { scale: s2, with_zone: z2 },
        ) => Ok(SqlType::Time {
            scale: (*s1).max(*s2),
            with_zone: *z1 || *z2,
        }),
        (SqlType::Date, SqlType::Time { .. }) | (SqlType::Time { .. }, SqlType::Date) => {
            Err(mismatch())
        }
        (l, r) => {
            let scale = datetime_scale(l).max(datetime_scale(r));
            let with_zone = has_zone(l) || has_zone(r);
            Ok(SqlType::Timestamp { scale, with_zone })
        }
    }
}

pub fn convert_to_type(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
    source: &SqlType,
) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => {
            retarget(session, target, value)
        }
        Value::String(_) | Value::Clob(_) if source.is_character() => {
            let text = super::character::as_text(session, value)?;
            parse_literal(session, target, text.trim())
        }
        other => Err(Error::IncompatibleTypes {
            left: target.name().to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

pub fn cast_to_type(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
    source: &SqlType,
    _warnings: &mut Vec<CastWarning>,
) -> Result<Value> {
    convert_to_type(session, target, value, source)
}

/// Re-apply the target's fraction scale; used when a value is stored into a
/// column of its own kind.
pub fn convert_to_type_limits(target: &SqlType, value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        v => {
            let ts = require_ts(v)?;
            let trimmed = TimestampValue {
                nanos: truncate_nanos(ts.nanos, datetime_scale(target)),
                ..*ts
            };
            Ok(rewrap(target, trimmed))
        }
    }
}

fn retarget(session: &dyn SessionContext, target: &SqlType, value: &Value) -> Result<Value> {
    let mismatch = |v: &Value| Error::IncompatibleTypes {
        left: target.name().to_string(),
        right: v.kind_name().to_string(),
    };
    let scale = datetime_scale(target);
    match target {
        SqlType::Date => {
            let ts = match value {
                Value::Date(t) => *t,
                Value::Timestamp(t) => {
                    let local = local_wall(session, t);
                    let date = seconds_to_naive(local, 0)?.date();
                    TimestampValue::from_date(date)
                }
                _ => return Err(mismatch(value)),
            };
            Ok(Value::Date(ts))
        }
        SqlType::Time { with_zone, .. } => {
            let ts = match value {
                Value::Time(t) | Value::Timestamp(t) => *t,
                _ => return Err(mismatch(value)),
            };
            let (seconds, zone) = shift_zone(session, ts.seconds, ts.zone, *with_zone);
            Ok(Value::Time(TimestampValue {
                seconds: seconds.rem_euclid(SECONDS_PER_DAY),
                nanos: truncate_nanos(ts.nanos, scale),
                zone,
            }))
        }
        SqlType::Timestamp { with_zone, .. } => {
            let ts = match value {
                Value::Timestamp(t) => *t,
                Value::Date(t) => *t,
                Value::Time(t) => {
                    // Widen against the session's current date.
                    let midnight = TimestampValue::from_date(session.current_date()).seconds;
                    TimestampValue {
                        seconds: midnight + t.seconds_in_day(),
                        ..*t
                    }
                }
                _ => return Err(mismatch(value)),
            };
            let (seconds, zone) = shift_zone(session, ts.seconds, ts.zone, *with_zone);
            Ok(Value::Timestamp(TimestampValue {
                seconds,
                nanos: truncate_nanos(ts.nanos, scale),
                zone,
            }))
        }
        _ => Err(Error::Internal(format!(
            "datetime kernel invoked for {}",
            target.name()
        ))),
    }
}

/// Zone-annotation transition. Unzoned values are local wall clock; zoned
/// values are UTC instants. Adding a zone interprets the wall clock in the
/// session's zone; stripping one renders the instant in the session's zone.
fn shift_zone(
    session: &dyn SessionContext,
    seconds: i64,
    zone: Option<i32>,
    target_zoned: bool,
) -> (i64, Option<i32>) {
    let off = session.zone_offset_seconds() as i64;
    match (zone, target_zoned) {
        (None, false) => (seconds, None),
        (None, true) => (seconds - off, Some(off as i32)),
        (Some(_), false) => (seconds + off, None),
        (Some(z), true) => (seconds, Some(z)),
    }
}

/// Wall-clock seconds of a value, resolving zoned instants through their own
/// offset.
fn local_wall(_session: &dyn SessionContext, ts: &TimestampValue) -> i64 {
    match ts.zone {
        Some(z) => ts.seconds + z as i64,
        None => ts.seconds,
    }
}

pub fn add_interval(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
    interval: &IntervalValue,
    negate: bool,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let ts = *require_ts(value)?;
    let out_of_range = || Error::IntervalOutOfRange {
        type_name: target.full_name(),
    };

    let shifted = match interval {
        IntervalValue::Months(m) => {
            let months = if negate { -*m } else { *m };
            // Month arithmetic happens in the value's own wall clock so the
            // end-of-month clamp sees the right calendar day.
            let wall = local_wall(session, &ts);
            let naive = seconds_to_naive(wall, ts.nanos)?;
            let shifted = add_months(naive, months).ok_or_else(out_of_range)?;
            let wall_seconds = shifted.and_utc().timestamp();
            let seconds = match ts.zone {
                Some(z) => wall_seconds - z as i64,
                None => wall_seconds,
            };
            TimestampValue {
                seconds,
                nanos: ts.nanos,
                zone: ts.zone,
            }
        }
        IntervalValue::Seconds { .. } => {
            let mut total = interval.total_nanos().ok_or_else(out_of_range)?;
            if negate {
                total = -total;
            }
            let base = ts.seconds as i128 * 1_000_000_000 + ts.nanos as i128;
            let sum = base.checked_add(total).ok_or_else(out_of_range)?;
            let seconds = i64::try_from(sum.div_euclid(1_000_000_000)).map_err(|_| out_of_range())?;
            let nanos = sum.rem_euclid(1_000_000_000) as u32;
            TimestampValue {
                seconds,
                nanos,
                zone: ts.zone,
            }
        }
    };

    let result = match target {
        // TIME arithmetic wraps around the day.
        SqlType::Time { .. } => Value::Time(TimestampValue {
            seconds: shifted.seconds.rem_euclid(SECONDS_PER_DAY),
            ..shifted
        }),
        SqlType::Date => {
            let date = seconds_to_naive(local_wall(session, &shifted), 0)?.date();
            Value::Date(TimestampValue::from_date(date))
        }
        _ => Value::Timestamp(shifted),
    };
    convert_to_type_limits(target, &result)
}

/// Datetime subtraction producing an interval of the given family.
pub fn between(
    session: &dyn SessionContext,
    a: &Value,
    b: &Value,
    year_month: bool,
) -> Result<IntervalValue> {
    let (x, y) = (*require_ts(a)?, *require_ts(b)?);
    if year_month {
        let dx = seconds_to_naive(local_wall(session, &x), 0)?.date();
        let dy = seconds_to_naive(local_wall(session, &y), 0)?.date();
        let months =
            (dx.year() as i64 * 12 + dx.month0() as i64) - (dy.year() as i64 * 12 + dy.month0() as i64);
        Ok(IntervalValue::Months(months))
    } else {
        let nx = x.seconds as i128 * 1_000_000_000 + x.nanos as i128;
        let ny = y.seconds as i128 * 1_000_000_000 + y.nanos as i128;
        IntervalValue::from_total_nanos(nx - ny).ok_or(Error::IntervalOutOfRange {
            type_name: "INTERVAL DAY TO SECOND".to_string(),
        })
    }
}

pub fn extract(
    session: &dyn SessionContext,
    source: &SqlType,
    part: DateTimePart,
    value: &Value,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let ts = require_ts(value)?;
    let invalid = || Error::InvalidExtractField {
        field: part.name().to_string(),
        type_name: source.name().to_string(),
    };
    if !part_applies(source, part) {
        return Err(invalid());
    }

    match part {
        DateTimePart::TimezoneHour => {
            let z = ts.zone.ok_or_else(invalid)?;
            return Ok(Value::Integer(z / 3600));
        }
        DateTimePart::TimezoneMinute => {
            let z = ts.zone.ok_or_else(invalid)?;
            return Ok(Value::Integer(z % 3600 / 60));
        }
        DateTimePart::SecondsSinceEpoch => return Ok(Value::BigInt(ts.seconds)),
        _ => {}
    }

    let naive = seconds_to_naive(local_wall(session, ts), ts.nanos)?;
    Ok(match part {
        DateTimePart::Year => Value::Integer(naive.year()),
        DateTimePart::Month => Value::Integer(naive.month() as i32),
        DateTimePart::Day => Value::Integer(naive.day() as i32),
        DateTimePart::Hour => Value::Integer(naive.hour() as i32),
        DateTimePart::Minute => Value::Integer(naive.minute() as i32),
        DateTimePart::Second => {
            // Seconds carry the fraction: NUMERIC with nanosecond scale.
            let total = naive.second() as i128 * 1_000_000_000 + ts.nanos as i128;
            Value::Numeric(Decimal::from_i128_with_scale(total, 9).normalize())
        }
        DateTimePart::DayOfWeek => {
            Value::Integer(naive.weekday().num_days_from_sunday() as i32 + 1)
        }
        DateTimePart::IsoDayOfWeek => {
            Value::Integer(naive.weekday().number_from_monday() as i32)
        }
        DateTimePart::DayOfYear => Value::Integer(naive.ordinal() as i32),
        DateTimePart::WeekOfYear => Value::Integer(naive.iso_week().week() as i32),
        DateTimePart::Quarter => Value::Integer(naive.month0() as i32 / 3 + 1),
        _ => unreachable!(),
    })
}

fn part_applies(ty: &SqlType, part: DateTimePart) -> bool {
    use DateTimePart::*;
    match ty {
        SqlType::Date => matches!(
            part,
            Year | Month | Day | DayOfWeek | IsoDayOfWeek | DayOfYear | WeekOfYear | Quarter
        ),
        SqlType::Time { with_zone, .. } => match part {
            Hour | Minute | Second => true,
            TimezoneHour | TimezoneMinute => *with_zone,
            _ => false,
        },
        SqlType::Timestamp { with_zone, .. } => match part {
            TimezoneHour | TimezoneMinute => *with_zone,
            SecondsSinceEpoch => true,
            _ => true,
        },
        _ => false,
    }
}

pub fn convert_to_string(
    session: &dyn SessionContext,
    source: &SqlType,
    value: &Value,
) -> Result<String> {
    let ts = require_ts(value)?;
    let scale = datetime_scale(source);
    let naive = seconds_to_naive(local_wall(session, ts), ts.nanos)?;
    let mut out = match source {
        SqlType::Date => naive.format("%Y-%m-%d").to_string(),
        SqlType::Time { .. } => naive.format("%H:%M:%S").to_string(),
        _ => naive.format("%Y-%m-%d %H:%M:%S").to_string(),
    };
    if scale > 0 {
        let fraction = ts.nanos / 10u32.pow(9 - scale);
        out.push_str(&format!(".{:0width$}", fraction, width = scale as usize));
    }
    if let Some(z) = ts.zone {
        let sign = if z < 0 { '-' } else { '+' };
        let z = z.abs();
        out.push_str(&format!("{}{:02}:{:02}", sign, z / 3600, z % 3600 / 60));
    }
    Ok(out)
}

pub fn convert_to_sql_string(
    session: &dyn SessionContext,
    source: &SqlType,
    value: &Value,
) -> Result<String> {
    let body = convert_to_string(session, source, value)?;
    let keyword = match source {
        SqlType::Date => "DATE",
        SqlType::Time { .. } => "TIME",
        _ => "TIMESTAMP",
    };
    Ok(format!("{} '{}'", keyword, body))
}

/// Parse a datetime literal body for the target type.
pub fn parse_literal(
    session: &dyn SessionContext,
    target: &SqlType,
    text: &str,
) -> Result<Value> {
    let bad = || Error::InvalidFormat {
        expected: target.name().to_string(),
        found: text.to_string(),
    };
    let value = match target {
        SqlType::Date => {
            let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| bad())?;
            Value::Date(TimestampValue::from_date(date))
        }
        SqlType::Time { .. } => {
            let (body, zone) = split_zone(text);
            let time = NaiveTime::parse_from_str(body, "%H:%M:%S%.f").map_err(|_| bad())?;
            let zone = zone.map(|z| parse_zone(z).ok_or_else(bad)).transpose()?;
            let ts = TimestampValue::from_time(time, None);
            let seconds = match zone {
                Some(z) => (ts.seconds - z as i64).rem_euclid(SECONDS_PER_DAY),
                None => ts.seconds,
            };
            Value::Time(TimestampValue { seconds, zone, ..ts })
        }
        SqlType::Timestamp { .. } => {
            let (body, zone) = split_zone(text);
            let naive = NaiveDateTime::parse_from_str(body, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f"))
                .map_err(|_| bad())?;
            let zone = zone.map(|z| parse_zone(z).ok_or_else(bad)).transpose()?;
            let mut ts = TimestampValue::from_datetime(naive, zone);
            if let Some(z) = zone {
                ts.seconds -= z as i64;
            }
            Value::Timestamp(ts)
        }
        _ => return Err(bad()),
    };
    retarget(session, target, &value)
}

/// Split a trailing `+HH:MM`/`-HH:MM` zone suffix off a literal body.
fn split_zone(text: &str) -> (&str, Option<&str>) {
    if text.len() > 6 {
        let tail = &text[text.len() - 6..];
        if (tail.starts_with('+') || tail.starts_with('-')) && tail.as_bytes()[3] == b':' {
            return (text[..text.len() - 6].trim_end(), Some(tail));
        }
    }
    (text, None)
}

fn parse_zone(text: &str) -> Option<i32> {
    let sign = match text.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let hours: i32 = text.get(1..3)?.parse().ok()?;
    let minutes: i32 = text.get(4..6)?.parse().ok()?;
    if hours > 18 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

fn add_months(naive: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        naive.checked_add_months(magnitude)
    } else {
        naive.checked_sub_months(magnitude)
    }
}

fn seconds_to_naive(seconds: i64, nanos: u32) -> Result<NaiveDateTime> {
    chrono::DateTime::from_timestamp(seconds, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| Error::InvalidValue("datetime out of range".to_string()))
}

fn rewrap(target: &SqlType, ts: TimestampValue) -> Value {
    match target {
        SqlType::Date => Value::Date(ts),
        SqlType::Time { .. } => Value::Time(ts),
        _ => Value::Timestamp(ts),
    }
}

fn require_ts(value: &Value) -> Result<&TimestampValue> {
    match value {
        Value::Date(t) | Value::Time(t) | Value::Timestamp(t) => Ok(t),
        other => Err(Error::IncompatibleTypes {
            left: "DATETIME".to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

fn truncate_nanos(nanos: u32, scale: u32) -> u32 {
    if scale >= 9 {
        nanos
    } else {
        nanos - nanos % 10u32.pow(9 - scale)
    }
}

fn datetime_scale(ty: &SqlType) -> u32 {
    match ty {
        SqlType::Time { scale, .. } | SqlType::Timestamp { scale, .. } => *scale,
        _ => 0,
    }
}

fn has_zone(ty: &SqlType) -> bool {
    matches!(
        ty,
        SqlType::Time { with_zone: true, .. } | SqlType::Timestamp { with_zone: true, .. }
    )
}
