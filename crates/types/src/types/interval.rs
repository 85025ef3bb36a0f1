//! Interval kernel
//!
//! Two disjoint families share the INTERVAL syntax: YEAR/MONTH intervals are
//! month counts, DAY..SECOND intervals are second/nanosecond counts. A type
//! names a start and end field plus a leading precision; values are range
//! checked against the start field and truncated below the end field.

use super::data_type::SqlType;
use super::value::Value;
use crate::error::{CastWarning, Error, Result};
use crate::session::SessionContext;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use silica_value::{IntervalValue, NANOS_PER_SECOND};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum IntervalField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl IntervalField {
    pub fn is_year_month(&self) -> bool {
        matches!(self, IntervalField::Year | IntervalField::Month)
    }

    /// Months per unit of this field (YEAR/MONTH family only).
    pub fn month_factor(&self) -> i64 {
        match self {
            IntervalField::Year => 12,
            _ => 1,
        }
    }

    /// Seconds per unit of this field (DAY..SECOND family only).
    pub fn second_factor(&self) -> i64 {
        match self {
            IntervalField::Day => 86_400,
            IntervalField::Hour => 3_600,
            IntervalField::Minute => 60,
            _ => 1,
        }
    }

    /// Significance order: YEAR is most significant.
    pub fn rank(&self) -> u8 {
        match self {
            IntervalField::Year => 0,
            IntervalField::Month => 1,
            IntervalField::Day => 2,
            IntervalField::Hour => 3,
            IntervalField::Minute => 4,
            IntervalField::Second => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            IntervalField::Year => "YEAR",
            IntervalField::Month => "MONTH",
            IntervalField::Day => "DAY",
            IntervalField::Hour => "HOUR",
            IntervalField::Minute => "MINUTE",
            IntervalField::Second => "SECOND",
        }
    }
}

/// (start, end, leading digits, fraction scale) of an interval type.
fn span(ty: &SqlType) -> Result<(IntervalField, IntervalField, u32, u32)> {
    match ty {
        SqlType::IntervalYearMonth {
            start,
            end,
            leading,
        } => Ok((*start, *end, *leading, 0)),
        SqlType::IntervalDayTime {
            start,
            end,
            leading,
            fraction,
        } => Ok((*start, *end, *leading, *fraction)),
        other => Err(Error::Internal(format!(
            "interval kernel invoked for {}",
            other.name()
        ))),
    }
}

pub fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    let (x, y) = (require_interval(a)?, require_interval(b)?);
    match (x, y) {
        (IntervalValue::Months(m), IntervalValue::Months(n)) => Ok(m.cmp(&n)),
        (IntervalValue::Seconds { .. }, IntervalValue::Seconds { .. }) => {
            Ok(x.total_nanos().cmp(&y.total_nanos()))
        }
        _ => Err(Error::IncompatibleTypes {
            left: "INTERVAL YEAR TO MONTH".to_string(),
            right: "INTERVAL DAY TO SECOND".to_string(),
        }),
    }
}

/// Merged span of two same-family interval types: the wider start, the finer
/// end, the larger budgets.
pub fn get_aggregate_type(left: &SqlType, right: &SqlType) -> Result<SqlType> {
    let (s1, e1, l1, f1) = span(left)?;
    let (s2, e2, l2, f2) = span(right)?;
    if s1.is_year_month() != s2.is_year_month() {
        return Err(Error::IncompatibleTypes {
            left: left.name().to_string(),
            right: right.name().to_string(),
        });
    }
    let start = if s1.rank() <= s2.rank() { s1 } else { s2 };
    let end = if e1.rank() >= e2.rank() { e1 } else { e2 };
    let leading = l1.max(l2);
    Ok(if start.is_year_month() {
        SqlType::IntervalYearMonth {
            start,
            end,
            leading,
        }
    } else {
        SqlType::IntervalDayTime {
            start,
            end,
            leading,
            fraction: f1.max(f2),
        }
    })
}

pub fn convert_to_type(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
    source: &SqlType,
) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Interval(iv) => normalize(target, *iv).map(Value::Interval),
        Value::String(_) | Value::Clob(_) if source.is_character() => {
            let text = super::character::as_text(session, value)?;
            parse_literal(target, text.trim())
        }
        // Numbers convert to single-field intervals as a unit count.
        v if v.is_numeric() && single_field(target)? => {
            let (start, _, _, fraction) = span(target)?;
            from_units(target, start, fraction, v)
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

pub fn convert_to_type_limits(target: &SqlType, value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Interval(iv) => normalize(target, *iv).map(Value::Interval),
        other => Err(Error::IncompatibleTypes {
            left: target.name().to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

/// Truncate below the end field and range check against the start field.
fn normalize(target: &SqlType, value: IntervalValue) -> Result<IntervalValue> {
    let (start, end, leading, fraction) = span(target)?;
    let out_of_range = || Error::IntervalOutOfRange {
        type_name: target.full_name(),
    };
    match value {
        IntervalValue::Months(m) => {
            if !start.is_year_month() {
                return Err(Error::IncompatibleTypes {
                    left: target.name().to_string(),
                    right: "INTERVAL YEAR TO MONTH".to_string(),
                });
            }
            // Sub-end fields truncate toward zero.
            let m = if end == IntervalField::Year { m - m % 12 } else { m };
            let limit = 10i64
                .checked_pow(leading)
                .and_then(|p| p.checked_mul(start.month_factor()))
                .ok_or_else(out_of_range)?;
            if m.unsigned_abs() >= limit as u64 {
                return Err(out_of_range());
            }
            Ok(IntervalValue::Months(m))
        }
        IntervalValue::Seconds { .. } => {
            if start.is_year_month() {
                return Err(Error::IncompatibleTypes {
                    left: target.name().to_string(),
                    right: "INTERVAL DAY TO SECOND".to_string(),
                });
            }
            let total = value.total_nanos().ok_or_else(out_of_range)?;
            let unit = if end == IntervalField::Second {
                10i128.pow(9 - fraction.min(9))
            } else {
                end.second_factor() as i128 * NANOS_PER_SECOND as i128
            };
            let total = total - total % unit;
            let limit = 10i128.pow(leading) * start.second_factor() as i128
                * NANOS_PER_SECOND as i128;
            if total.unsigned_abs() >= limit as u128 {
                return Err(out_of_range());
            }
            IntervalValue::from_total_nanos(total)
                .map(Ok)
                .unwrap_or_else(|| Err(out_of_range()))
        }
    }
}

pub fn add(target: &SqlType, a: &Value, b: &Value) -> Result<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    let (x, y) = (require_interval(a)?, require_interval(b)?);
    require_same_family(&x, &y)?;
    let sum = x.checked_add(&y).ok_or(Error::IntervalOutOfRange {
        type_name: target.full_name(),
    })?;
    normalize(target, sum).map(Value::Interval)
}

pub fn subtract(target: &SqlType, a: &Value, b: &Value) -> Result<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    let (x, y) = (require_interval(a)?, require_interval(b)?);
    require_same_family(&x, &y)?;
    let diff = x.checked_sub(&y).ok_or(Error::IntervalOutOfRange {
        type_name: target.full_name(),
    })?;
    normalize(target, diff).map(Value::Interval)
}

/// Month and second counts never mix; that is a type error, not a range
/// error.
fn require_same_family(x: &IntervalValue, y: &IntervalValue) -> Result<()> {
    if x.is_year_month() == y.is_year_month() {
        return Ok(());
    }
    let family = |iv: &IntervalValue| {
        if iv.is_year_month() {
            "INTERVAL YEAR TO MONTH"
        } else {
            "INTERVAL DAY TO SECOND"
        }
    };
    Err(Error::IncompatibleTypes {
        left: family(x).to_string(),
        right: family(y).to_string(),
    })
}

pub fn negate(target: &SqlType, value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        v => {
            let iv = require_interval(v)?;
            let neg = iv.checked_neg().ok_or(Error::IntervalOutOfRange {
                type_name: target.full_name(),
            })?;
            normalize(target, neg).map(Value::Interval)
        }
    }
}

/// Interval times a numeric factor: exact mantissa arithmetic, truncating
/// toward zero.
pub fn multiply(target: &SqlType, value: &Value, factor: &Value) -> Result<Value> {
    scale_by(target, value, factor, false)
}

pub fn divide(target: &SqlType, value: &Value, divisor: &Value) -> Result<Value> {
    scale_by(target, value, divisor, true)
}

fn scale_by(target: &SqlType, value: &Value, factor: &Value, invert: bool) -> Result<Value> {
    if value.is_null() || factor.is_null() {
        return Ok(Value::Null);
    }
    let iv = require_interval(value)?;
    let out_of_range = || Error::IntervalOutOfRange {
        type_name: target.full_name(),
    };
    let d = factor
        .as_decimal()
        .or_else(|| factor.as_f64().and_then(Decimal::from_f64))
        .ok_or_else(|| Error::IncompatibleTypes {
            left: target.name().to_string(),
            right: factor.kind_name().to_string(),
        })?;
    let mantissa = d.mantissa();
    let power = 10i128.pow(d.scale());
    let (num, den) = if invert {
        if mantissa == 0 {
            return Err(Error::DivisionByZero);
        }
        (power, mantissa)
    } else {
        (mantissa, power)
    };

    let scaled = match iv {
        IntervalValue::Months(m) => {
            let total = (m as i128)
                .checked_mul(num)
                .ok_or_else(out_of_range)?
                / den;
            IntervalValue::Months(i64::try_from(total).map_err(|_| out_of_range())?)
        }
        IntervalValue::Seconds { .. } => {
            let total = iv.total_nanos().ok_or_else(out_of_range)?;
            let product = total.checked_mul(num).ok_or_else(out_of_range)? / den;
            IntervalValue::from_total_nanos(product).ok_or_else(out_of_range)?
        }
    };
    normalize(target, scaled).map(Value::Interval)
}

/// Unit count of the start field, for numeric conversion of single-field
/// intervals.
pub fn to_field_units(source: &SqlType, value: &Value) -> Result<Value> {
    let (start, _, _, _) = span(source)?;
    if !single_field(source)? {
        return Err(Error::IncompatibleTypes {
            left: "NUMERIC".to_string(),
            right: source.name().to_string(),
        });
    }
    let iv = require_interval(value)?;
    match iv {
        IntervalValue::Months(m) => Ok(Value::BigInt(m / start.month_factor())),
        IntervalValue::Seconds { .. } => {
            let total = iv.total_nanos().ok_or(Error::Internal(
                "year-month interval in day-time path".to_string(),
            ))?;
            let units = total / (start.second_factor() as i128 * NANOS_PER_SECOND as i128);
            Ok(Value::BigInt(units as i64))
        }
    }
}

fn from_units(
    target: &SqlType,
    start: IntervalField,
    fraction: u32,
    value: &Value,
) -> Result<Value> {
    let out_of_range = || Error::IntervalOutOfRange {
        type_name: target.full_name(),
    };
    let d = value
        .as_decimal()
        .or_else(|| value.as_f64().and_then(Decimal::from_f64))
        .ok_or_else(out_of_range)?;
    let iv = if start.is_year_month() {
        let months = (d * Decimal::from(start.month_factor()))
            .trunc()
            .to_i64()
            .ok_or_else(out_of_range)?;
        IntervalValue::Months(months)
    } else {
        let _ = fraction;
        let nanos = d.mantissa()
            .checked_mul(start.second_factor() as i128)
            .and_then(|n| n.checked_mul(NANOS_PER_SECOND as i128))
            .ok_or_else(out_of_range)?
            / 10i128.pow(d.scale());
        IntervalValue::from_total_nanos(nanos).ok_or_else(out_of_range)?
    };
    normalize(target, iv).map(Value::Interval)
}

pub fn extract(source: &SqlType, part: IntervalField, value: &Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let (start, end, _, fraction) = span(source)?;
    if part.is_year_month() != start.is_year_month()
        || part.rank() < start.rank()
        || part.rank() > end.rank()
    {
        return Err(Error::InvalidExtractField {
            field: part.name().to_string(),
            type_name: source.name().to_string(),
        });
    }
    let iv = require_interval(value)?;
    Ok(match (iv, part) {
        (IntervalValue::Months(m), IntervalField::Year) => Value::BigInt(m / 12),
        (IntervalValue::Months(m), IntervalField::Month) => {
            if start == IntervalField::Month {
                Value::BigInt(m)
            } else {
                Value::BigInt(m % 12)
            }
        }
        (IntervalValue::Seconds { .. }, field) => {
            let total = iv.total_nanos().unwrap_or(0);
            let factor = field.second_factor() as i128 * NANOS_PER_SECOND as i128;
            let units = if field == start {
                total / factor
            } else {
                let outer = outer_field(field).second_factor() as i128
                    * NANOS_PER_SECOND as i128;
                total % outer / factor
            };
            if field == IntervalField::Second && fraction > 0 {
                let frac_nanos = total % NANOS_PER_SECOND as i128;
                let composed = units * NANOS_PER_SECOND as i128 + frac_nanos;
                Value::Numeric(Decimal::from_i128_with_scale(composed, 9).normalize())
            } else {
                Value::BigInt(units as i64)
            }
        }
        _ => {
            return Err(Error::InvalidExtractField {
                field: part.name().to_string(),
                type_name: source.name().to_string(),
            });
        }
    })
}

fn outer_field(field: IntervalField) -> IntervalField {
    match field {
        IntervalField::Hour => IntervalField::Day,
        IntervalField::Minute => IntervalField::Hour,
        IntervalField::Second => IntervalField::Minute,
        other => other,
    }
}

pub fn convert_to_string(source: &SqlType, value: &Value) -> Result<String> {
    let (start, end, _, fraction) = span(source)?;
    let iv = require_interval(value)?;
    let mut out = String::new();
    match iv {
        IntervalValue::Months(m) => {
            if m < 0 {
                out.push('-');
            }
            let m = m.unsigned_abs();
            match (start, end) {
                (IntervalField::Year, IntervalField::Year) => {
                    out.push_str(&(m / 12).to_string());
                }
                (IntervalField::Month, _) => out.push_str(&m.to_string()),
                _ => out.push_str(&format!("{}-{}", m / 12, m % 12)),
            }
        }
        IntervalValue::Seconds { .. } => {
            let total = iv.total_nanos().unwrap_or(0);
            if total < 0 {
                out.push('-');
            }
            let total = total.unsigned_abs();
            let nanos = (total % NANOS_PER_SECOND as u128) as u32;
            let mut seconds = (total / NANOS_PER_SECOND as u128) as u64;

            let mut first = true;
            let mut after_day = false;
            for field in [
                IntervalField::Day,
                IntervalField::Hour,
                IntervalField::Minute,
                IntervalField::Second,
            ] {
                if field.rank() < start.rank() || field.rank() > end.rank() {
                    continue;
                }
                let factor = field.second_factor() as u64;
                let units = seconds / factor;
                seconds %= factor;
                if first {
                    out.push_str(&units.to_string());
                    first = false;
                } else if after_day {
                    out.push_str(&format!(" {:02}", units));
                } else {
                    out.push_str(&format!(":{:02}", units));
                }
                after_day = field == IntervalField::Day;
            }
            if end == IntervalField::Second && fraction > 0 {
                let frac = nanos / 10u32.pow(9 - fraction);
                out.push_str(&format!(".{:0width$}", frac, width = fraction as usize));
            }
        }
    }
    Ok(out)
}

pub fn convert_to_sql_string(source: &SqlType, value: &Value) -> Result<String> {
    let (start, end, _, _) = span(source)?;
    let body = convert_to_string(source, value)?;
    let qualifier = if start == end {
        start.name().to_string()
    } else {
        format!("{} TO {}", start.name(), end.name())
    };
    Ok(format!("INTERVAL '{}' {}", body, qualifier))
}

/// Parse the canonical literal body for the target span.
pub fn parse_literal(target: &SqlType, text: &str) -> Result<Value> {
    let (start, end, _, _) = span(target)?;
    let bad = || Error::InvalidFormat {
        expected: target.name().to_string(),
        found: text.to_string(),
    };
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1i64, rest.trim_start()),
        None => (1i64, text.strip_prefix('+').unwrap_or(text).trim_start()),
    };

    let iv = if start.is_year_month() {
        let months = match body.split_once('-') {
            Some((y, m)) => {
                let years: i64 = y.trim().parse().map_err(|_| bad())?;
                let months: i64 = m.trim().parse().map_err(|_| bad())?;
                if months >= 12 {
                    return Err(bad());
                }
                years * 12 + months
            }
            None => {
                let units: i64 = body.trim().parse().map_err(|_| bad())?;
                units * start.month_factor()
            }
        };
        IntervalValue::Months(sign * months)
    } else {
        let (day_part, time_part) = match body.split_once(char::is_whitespace) {
            Some((d, t)) if start == IntervalField::Day => (Some(d), t.trim_start()),
            _ => (None, body),
        };
        let mut total_nanos: i128 = 0;
        if let Some(d) = day_part {
            let days: i64 = d.trim().parse().map_err(|_| bad())?;
            total_nanos += days as i128 * 86_400 * NANOS_PER_SECOND as i128;
        }

        let first_field = if day_part.is_some() {
            IntervalField::Hour
        } else {
            start
        };
        let expected = (end.rank() as i16 - first_field.rank() as i16 + 1).max(0);
        let mut field = first_field;
        for (i, component) in time_part.split(':').enumerate() {
            if i as i16 >= expected {
                return Err(bad());
            }
            let value = if field == IntervalField::Second {
                let secs: Decimal = component.trim().parse().map_err(|_| bad())?;
                (secs * Decimal::from(NANOS_PER_SECOND))
                    .trunc()
                    .to_i128()
                    .ok_or_else(bad)?
            } else {
                let units: i64 = component.trim().parse().map_err(|_| bad())?;
                units as i128 * NANOS_PER_SECOND as i128
            };
            total_nanos += value * field.second_factor() as i128;
            field = next_field(field);
        }
        IntervalValue::from_total_nanos(sign as i128 * total_nanos).ok_or_else(bad)?
    };
    normalize(target, iv).map(Value::Interval)
}

fn next_field(field: IntervalField) -> IntervalField {
    match field {
        IntervalField::Day => IntervalField::Hour,
        IntervalField::Hour => IntervalField::Minute,
        _ => IntervalField::Second,
    }
}

fn single_field(ty: &SqlType) -> Result<bool> {
    let (start, end, _, _) = span(ty)?;
    Ok(start == end)
}

fn require_interval(value: &Value) -> Result<IntervalValue> {
    match value {
        Value::Interval(iv) => Ok(*iv),
        other => Err(Error::IncompatibleTypes {
            left: "INTERVAL".to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}
