//! Numeric kernel
//!
//! Exact (TINYINT..BIGINT, NUMERIC) and approximate (DOUBLE) numeric types:
//! promotion, precision/scale propagation, rounding, and range checks. All
//! functions are pure value transforms.
//!
//! Width classes combine through a fixed lattice: integer widths below 32
//! bits sum to INTEGER, below 64 bits to BIGINT, anything wider goes through
//! NUMERIC, and DOUBLE absorbs everything.

use super::data_type::{OperatorKind, SqlType};
use super::registry::MAX_NUMERIC_PRECISION;
use super::value::Value;
use crate::error::{CastWarning, Error, Result};
use crate::session::{DoubleZeroPolicy, SessionContext};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;

/// Width class of a numeric type, ordered by the promotion lattice.
pub(crate) fn width(ty: &SqlType) -> u32 {
    match ty {
        SqlType::TinyInt => 8,
        SqlType::SmallInt => 16,
        SqlType::Integer => 32,
        SqlType::BigInt => 64,
        SqlType::Numeric { .. } => 128,
        SqlType::Double => 256,
        _ => 0,
    }
}

/// Decimal digit precision and scale of a numeric type, used when the
/// combination falls through to NUMERIC.
fn digits(ty: &SqlType) -> (u32, u32) {
    match ty {
        SqlType::TinyInt => (3, 0),
        SqlType::SmallInt => (5, 0),
        SqlType::Integer => (10, 0),
        SqlType::BigInt => (19, 0),
        SqlType::Numeric { precision, scale } => (*precision, *scale),
        _ => (0, 0),
    }
}

pub fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    if matches!(a, Value::Double(_)) || matches!(b, Value::Double(_)) {
        let (x, y) = (require_f64(a)?, require_f64(b)?);
        return Ok(x.partial_cmp(&y).unwrap_or(Ordering::Equal));
    }
    let x = a
        .as_decimal()
        .ok_or_else(|| incompatible("NUMERIC", a))?;
    let y = b
        .as_decimal()
        .ok_or_else(|| incompatible("NUMERIC", b))?;
    Ok(x.cmp(&y))
}

pub fn get_aggregate_type(left: &SqlType, right: &SqlType) -> Result<SqlType> {
    if left == right {
        return Ok(left.clone());
    }
    if matches!(left, SqlType::Double) || matches!(right, SqlType::Double) {
        return Ok(SqlType::Double);
    }
    let (wl, wr) = (width(left), width(right));
    if wl <= 64 && wr <= 64 {
        return Ok(if wl >= wr { left.clone() } else { right.clone() });
    }
    let ((pl, sl), (pr, sr)) = (digits(left), digits(right));
    let scale = sl.max(sr);
    let integer_digits = (pl - sl).max(pr - sr);
    Ok(SqlType::Numeric {
        precision: (integer_digits + scale).min(MAX_NUMERIC_PRECISION),
        scale,
    })
}

/// Result type of a numeric operator. ADD widens the integer digits by one;
/// MULTIPLY sums scales and integer digits; DIVIDE widens the dividend's
/// integer digits by the divisor's scale and keeps the larger scale;
/// everything else takes the aggregate type.
pub fn get_combined_type(left: &SqlType, right: &SqlType, op: OperatorKind) -> Result<SqlType> {
    match op {
        OperatorKind::Add | OperatorKind::Multiply | OperatorKind::Divide => {}
        _ => return get_aggregate_type(left, right),
    }

    if matches!(left, SqlType::Double) || matches!(right, SqlType::Double) {
        return Ok(SqlType::Double);
    }
    let sum = width(left) + width(right);
    if sum <= 32 {
        return Ok(SqlType::Integer);
    }
    if sum <= 64 {
        return Ok(SqlType::BigInt);
    }

    let ((pl, sl), (pr, sr)) = (digits(left), digits(right));
    let (integer_digits, scale) = match op {
        OperatorKind::Add => ((pl - sl).max(pr - sr) + 1, sl.max(sr)),
        OperatorKind::Multiply => ((pl - sl) + (pr - sr), sl + sr),
        OperatorKind::Divide => ((pl - sl) + sr, sl.max(sr)),
        _ => unreachable!(),
    };
    let scale = scale.min(MAX_NUMERIC_PRECISION);
    Ok(SqlType::Numeric {
        precision: (integer_digits + scale).min(MAX_NUMERIC_PRECISION),
        scale,
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
        v if v.is_numeric() => convert_numeric(session, target, v),
        Value::String(_) | Value::Clob(_) => {
            let text = super::character::as_text(session, value)?;
            convert_numeric(session, target, &parse_numeric(target, text.trim())?)
        }
        Value::Interval(_) if source.is_interval() => {
            let units = super::interval::to_field_units(source, value)?;
            convert_numeric(session, target, &units)
        }
        other => Err(incompatible(target.name(), other)),
    }
}

pub fn cast_to_type(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
    source: &SqlType,
    _warnings: &mut Vec<CastWarning>,
) -> Result<Value> {
    // Explicit casts additionally accept BOOLEAN; numeric magnitude overflow
    // stays fatal either way.
    if let Value::Boolean(b) = value {
        return convert_numeric(session, target, &Value::TinyInt(*b as i8));
    }
    convert_to_type(session, target, value, source)
}

pub fn convert_to_type_limits(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        v => convert_numeric(session, target, v),
    }
}

fn convert_numeric(session: &dyn SessionContext, target: &SqlType, value: &Value) -> Result<Value> {
    match target {
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
            let wide = to_i64_rounded(session, target, value)?;
            integer_in_range(target, wide)
        }
        SqlType::Numeric { precision, scale } => {
            let d = exact_decimal(target, value)?;
            enforce_decimal_limits(session, target, *precision, *scale, d).map(Value::Numeric)
        }
        SqlType::Double => Ok(Value::Double(require_f64(value)?)),
        _ => Err(Error::Internal(format!(
            "numeric kernel invoked for {}",
            target.name()
        ))),
    }
}

/// Collapse any numeric representation to i64, applying the session's
/// truncate-or-round policy to excess fraction digits.
fn to_i64_rounded(session: &dyn SessionContext, target: &SqlType, value: &Value) -> Result<i64> {
    if let Some(v) = value.as_i64() {
        return Ok(v);
    }
    let d = exact_decimal(target, value)?;
    let whole = if session.numeric_truncates() {
        d.round_dp_with_strategy(0, RoundingStrategy::ToZero)
    } else {
        d.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    };
    whole.to_i64().ok_or_else(|| overflow(target))
}

fn integer_in_range(target: &SqlType, v: i64) -> Result<Value> {
    match target {
        SqlType::TinyInt => i8::try_from(v)
            .map(Value::TinyInt)
            .map_err(|_| overflow(target)),
        SqlType::SmallInt => i16::try_from(v)
            .map(Value::SmallInt)
            .map_err(|_| overflow(target)),
        SqlType::Integer => i32::try_from(v)
            .map(Value::Integer)
            .map_err(|_| overflow(target)),
        SqlType::BigInt => Ok(Value::BigInt(v)),
        _ => Err(Error::Internal("not an integer type".into())),
    }
}

fn exact_decimal(target: &SqlType, value: &Value) -> Result<Decimal> {
    if let Some(d) = value.as_decimal() {
        return Ok(d);
    }
    if let Value::Double(v) = value {
        if !v.is_finite() {
            return Err(overflow(target));
        }
        return Decimal::from_f64(*v).ok_or_else(|| overflow(target));
    }
    Err(incompatible(target.name(), value))
}

/// Rescale to the declared scale and range-check the digit count. Truncation
/// versus rounding of excess fraction follows the session policy; exceeding
/// the declared precision is always fatal.
fn enforce_decimal_limits(
    session: &dyn SessionContext,
    target: &SqlType,
    precision: u32,
    scale: u32,
    d: Decimal,
) -> Result<Decimal> {
    let d = if d.scale() > scale {
        let strategy = if session.numeric_truncates() {
            RoundingStrategy::ToZero
        } else {
            RoundingStrategy::MidpointAwayFromZero
        };
        d.round_dp_with_strategy(scale, strategy)
    } else {
        d
    };
    check_digit_count(target, precision, scale, &d)?;
    Ok(d)
}

fn check_digit_count(target: &SqlType, precision: u32, scale: u32, d: &Decimal) -> Result<()> {
    let limit = pow10(precision.saturating_sub(scale));
    if d.abs().trunc() >= limit {
        return Err(overflow(target));
    }
    Ok(())
}

fn pow10(n: u32) -> Decimal {
    Decimal::from_i128_with_scale(10i128.pow(n.min(MAX_NUMERIC_PRECISION)), 0)
}

pub fn add(session: &dyn SessionContext, target: &SqlType, a: &Value, b: &Value) -> Result<Value> {
    binary_op(session, target, a, b, |x, y| x.checked_add(y), |x, y| {
        x.checked_add(y)
    }, |x, y| x + y)
}

pub fn subtract(
    session: &dyn SessionContext,
    target: &SqlType,
    a: &Value,
    b: &Value,
) -> Result<Value> {
    binary_op(session, target, a, b, |x, y| x.checked_sub(y), |x, y| {
        x.checked_sub(y)
    }, |x, y| x - y)
}

pub fn multiply(
    session: &dyn SessionContext,
    target: &SqlType,
    a: &Value,
    b: &Value,
) -> Result<Value> {
    match target {
        SqlType::Numeric { precision, scale } => {
            let (x, y) = (exact_decimal(target, a)?, exact_decimal(target, b)?);
            let product = x.checked_mul(y).ok_or_else(|| overflow(target))?;
            // Rescale of an over-wide product rounds half-even.
            let product = if product.scale() > *scale {
                product.round_dp_with_strategy(*scale, RoundingStrategy::MidpointNearestEven)
            } else {
                product
            };
            check_digit_count(target, *precision, *scale, &product)?;
            Ok(Value::Numeric(product))
        }
        _ => binary_op(session, target, a, b, |x, y| x.checked_mul(y), |x, y| {
            x.checked_mul(y)
        }, |x, y| x * y),
    }
}

pub fn divide(
    session: &dyn SessionContext,
    target: &SqlType,
    a: &Value,
    b: &Value,
) -> Result<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    match target {
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
            let (x, y) = (require_i64(target, a)?, require_i64(target, b)?);
            if y == 0 {
                return Err(Error::DivisionByZero);
            }
            let q = x.checked_div(y).ok_or_else(|| overflow(target))?;
            integer_in_range(target, q)
        }
        SqlType::Numeric { precision, scale } => {
            let (x, y) = (exact_decimal(target, a)?, exact_decimal(target, b)?);
            if y.is_zero() {
                return Err(Error::DivisionByZero);
            }
            let result_scale = (*scale).max(session.min_division_scale());
            let q = x.checked_div(y).ok_or_else(|| overflow(target))?;
            // Division truncates toward zero at the result scale.
            let q = q.round_dp_with_strategy(result_scale, RoundingStrategy::ToZero);
            check_digit_count(target, (*precision).max(result_scale), result_scale, &q)?;
            Ok(Value::Numeric(q))
        }
        SqlType::Double => {
            let (x, y) = (require_f64(a)?, require_f64(b)?);
            if y == 0.0 && session.double_zero_division() == DoubleZeroPolicy::Error {
                return Err(Error::DivisionByZero);
            }
            Ok(Value::Double(x / y))
        }
        _ => Err(Error::Internal("numeric divide on non-numeric type".into())),
    }
}

pub fn negate(target: &SqlType, value: &Value) -> Result<Value> {
    match (target, value) {
        (_, Value::Null) => Ok(Value::Null),
        (SqlType::TinyInt, Value::TinyInt(v)) => v
            .checked_neg()
            .map(Value::TinyInt)
            .ok_or_else(|| overflow(target)),
        (SqlType::SmallInt, Value::SmallInt(v)) => v
            .checked_neg()
            .map(Value::SmallInt)
            .ok_or_else(|| overflow(target)),
        (SqlType::Integer, Value::Integer(v)) => v
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| overflow(target)),
        (SqlType::BigInt, Value::BigInt(v)) => v
            .checked_neg()
            .map(Value::BigInt)
            .ok_or_else(|| overflow(target)),
        (SqlType::Numeric { .. }, Value::Numeric(d)) => Ok(Value::Numeric(-d)),
        (SqlType::Double, Value::Double(v)) => Ok(Value::Double(-v)),
        (_, other) => Err(incompatible(target.name(), other)),
    }
}

/// Explicit ROUND to a digit count: half-up, per the standard.
pub fn round(target: &SqlType, value: &Value, digits: i32) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Numeric(d) => {
            let rounded = if digits >= 0 {
                d.round_dp_with_strategy(digits as u32, RoundingStrategy::MidpointAwayFromZero)
            } else {
                let factor = pow10((-digits) as u32);
                ((d / factor)
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
                    * factor
            };
            Ok(Value::Numeric(rounded))
        }
        Value::Double(v) => {
            let factor = 10f64.powi(digits);
            Ok(Value::Double((v * factor).round() / factor))
        }
        v if v.is_integer() => Ok(v.clone()),
        other => Err(incompatible(target.name(), other)),
    }
}

pub fn convert_to_string(value: &Value) -> Result<String> {
    match value {
        Value::TinyInt(v) => Ok(v.to_string()),
        Value::SmallInt(v) => Ok(v.to_string()),
        Value::Integer(v) => Ok(v.to_string()),
        Value::BigInt(v) => Ok(v.to_string()),
        Value::Numeric(d) => Ok(d.to_string()),
        // Shortest round-trippable form; parses back to the same bits.
        Value::Double(v) => Ok(v.to_string()),
        other => Err(incompatible("NUMERIC", other)),
    }
}

pub(crate) fn parse_numeric(target: &SqlType, text: &str) -> Result<Value> {
    let bad = || Error::InvalidFormat {
        expected: target.name().to_string(),
        found: text.to_string(),
    };
    match target {
        SqlType::Double => text.parse::<f64>().map(Value::Double).map_err(|_| bad()),
        _ => {
            if let Ok(d) = text.parse::<Decimal>() {
                return Ok(Value::Numeric(d));
            }
            // Exponent forms fall back through f64.
            let v = text.parse::<f64>().map_err(|_| bad())?;
            Decimal::from_f64(v).map(Value::Numeric).ok_or_else(bad)
        }
    }
}

fn binary_op(
    _session: &dyn SessionContext,
    target: &SqlType,
    a: &Value,
    b: &Value,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    dec_op: impl Fn(Decimal, Decimal) -> Option<Decimal>,
    f64_op: impl Fn(f64, f64) -> f64,
) -> Result<Value> {
    if a.is_null() || b.is_null() {
        return Ok(Value::Null);
    }
    match target {
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
            let (x, y) = (require_i64(target, a)?, require_i64(target, b)?);
            let r = int_op(x, y).ok_or_else(|| overflow(target))?;
            integer_in_range(target, r)
        }
        SqlType::Numeric { precision, scale } => {
            let (x, y) = (exact_decimal(target, a)?, exact_decimal(target, b)?);
            let r = dec_op(x, y).ok_or_else(|| overflow(target))?;
            check_digit_count(target, (*precision).max(r.scale()), *scale.max(&r.scale()), &r)?;
            Ok(Value::Numeric(r))
        }
        SqlType::Double => Ok(Value::Double(f64_op(require_f64(a)?, require_f64(b)?))),
        _ => Err(Error::Internal("numeric op on non-numeric type".into())),
    }
}

fn require_i64(target: &SqlType, value: &Value) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| incompatible(target.name(), value))
}

fn require_f64(value: &Value) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| incompatible("DOUBLE", value))
}

fn overflow(target: &SqlType) -> Error {
    Error::NumericOverflow {
        type_name: target.full_name(),
    }
}

fn incompatible(expected: &str, value: &Value) -> Error {
    Error::IncompatibleTypes {
        left: expected.to_string(),
        right: value.kind_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LocalSession;

    fn numeric(p: u32, s: u32) -> SqlType {
        SqlType::Numeric {
            precision: p,
            scale: s,
        }
    }

    #[test]
    fn test_integer_promotion_lattice() {
        let t = get_combined_type(&SqlType::TinyInt, &SqlType::SmallInt, OperatorKind::Add)
            .unwrap();
        assert_eq!(t, SqlType::Integer);
        let t = get_combined_type(&SqlType::Integer, &SqlType::Integer, OperatorKind::Add)
            .unwrap();
        assert_eq!(t, SqlType::BigInt);
        let t = get_combined_type(&SqlType::BigInt, &SqlType::Integer, OperatorKind::Multiply)
            .unwrap();
        assert_eq!(t, numeric(29.min(MAX_NUMERIC_PRECISION), 0));
    }

    #[test]
    fn test_add_scale_rule() {
        // NUMERIC(6,2) + NUMERIC(5,3): scale 3, integer digits max(4,2)+1 = 5
        let t = get_combined_type(&numeric(6, 2), &numeric(5, 3), OperatorKind::Add).unwrap();
        assert_eq!(t, numeric(8, 3));
    }

    #[test]
    fn test_multiply_scale_rule() {
        let t = get_combined_type(&numeric(6, 2), &numeric(5, 3), OperatorKind::Multiply)
            .unwrap();
        assert_eq!(t, numeric(11, 5));
    }

    #[test]
    fn test_divide_scale_rule() {
        // NUMERIC(10,2) / NUMERIC(5,4): integer digits (10-2)+4 = 12,
        // scale max(2,4) = 4.
        let t = get_combined_type(&numeric(10, 2), &numeric(5, 4), OperatorKind::Divide)
            .unwrap();
        assert_eq!(t, numeric(16, 4));
    }

    #[test]
    fn test_aggregate_is_monotonic() {
        let t = get_aggregate_type(&numeric(6, 2), &numeric(5, 3)).unwrap();
        assert_eq!(t, numeric(7, 3));
        let t = get_aggregate_type(&SqlType::Integer, &numeric(5, 3)).unwrap();
        assert_eq!(t, numeric(13, 3));
        let t = get_aggregate_type(&SqlType::Double, &numeric(5, 3)).unwrap();
        assert_eq!(t, SqlType::Double);
    }

    #[test]
    fn test_precision_overflow() {
        let session = LocalSession::new();
        let target = numeric(3, 0);
        let err = convert_to_type_limits(&session, &target, &Value::Numeric(Decimal::from(1234)))
            .unwrap_err();
        assert!(matches!(err, Error::NumericOverflow { .. }));

        let ok = convert_to_type_limits(&session, &target, &Value::Numeric(Decimal::from(999)))
            .unwrap();
        assert_eq!(ok, Value::Numeric(Decimal::from(999)));
    }

    #[test]
    fn test_limits_idempotent() {
        let session = LocalSession::new();
        let target = numeric(8, 2);
        let v = Value::Numeric("123.456".parse().unwrap());
        let once = convert_to_type_limits(&session, &target, &v).unwrap();
        let twice = convert_to_type_limits(&session, &target, &once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, Value::Numeric("123.45".parse().unwrap()));
    }

    #[test]
    fn test_fraction_policy() {
        let truncating = LocalSession::new();
        let rounding = LocalSession::new().with_rounding_conversions();
        let v = Value::Numeric("2.9".parse().unwrap());
        assert_eq!(
            convert_to_type(&truncating, &SqlType::Integer, &v, &SqlType::NUMERIC).unwrap(),
            Value::Integer(2)
        );
        assert_eq!(
            convert_to_type(&rounding, &SqlType::Integer, &v, &SqlType::NUMERIC).unwrap(),
            Value::Integer(3)
        );
    }

    #[test]
    fn test_divide_truncates_toward_zero() {
        let session = LocalSession::new();
        let target = numeric(10, 2);
        let r = divide(
            &session,
            &target,
            &Value::Numeric(Decimal::from(-7)),
            &Value::Numeric(Decimal::from(2)),
        )
        .unwrap();
        assert_eq!(r, Value::Numeric("-3.50".parse().unwrap()));

        let r = divide(
            &session,
            &target,
            &Value::Numeric(Decimal::from(10)),
            &Value::Numeric(Decimal::from(3)),
        )
        .unwrap();
        assert_eq!(r, Value::Numeric("3.33".parse().unwrap()));
    }

    #[test]
    fn test_division_by_zero() {
        let session = LocalSession::new();
        assert_eq!(
            divide(
                &session,
                &SqlType::Integer,
                &Value::Integer(1),
                &Value::Integer(0)
            ),
            Err(Error::DivisionByZero)
        );
        assert_eq!(
            divide(
                &session,
                &SqlType::Double,
                &Value::Double(1.0),
                &Value::Double(0.0)
            ),
            Err(Error::DivisionByZero)
        );

        let ieee = LocalSession::new().with_double_zero_division(DoubleZeroPolicy::Ieee);
        let r = divide(&ieee, &SqlType::Double, &Value::Double(1.0), &Value::Double(0.0))
            .unwrap();
        assert_eq!(r, Value::Double(f64::INFINITY));
    }

    #[test]
    fn test_negate_min_overflows() {
        assert!(matches!(
            negate(&SqlType::Integer, &Value::Integer(i32::MIN)),
            Err(Error::NumericOverflow { .. })
        ));
        assert_eq!(
            negate(&SqlType::Integer, &Value::Integer(5)).unwrap(),
            Value::Integer(-5)
        );
    }

    #[test]
    fn test_multiply_rescales_half_even() {
        let session = LocalSession::new();
        let target = numeric(10, 2);
        // 1.25 * 1.1 = 1.375 -> half-even at scale 2 -> 1.38? No: 1.375 rounds
        // to 1.38 under away-from-zero but 1.38 under nearest-even as well
        // (7 is odd, bumps to 8). Use .125 ties instead: 0.5 * 0.25 = 0.125.
        let r = multiply(
            &session,
            &target,
            &Value::Numeric("0.5".parse().unwrap()),
            &Value::Numeric("0.25".parse().unwrap()),
        )
        .unwrap();
        assert_eq!(r, Value::Numeric("0.12".parse().unwrap()));
    }

    #[test]
    fn test_round_half_up() {
        let r = round(
            &SqlType::NUMERIC,
            &Value::Numeric("2.5".parse().unwrap()),
            0,
        )
        .unwrap();
        assert_eq!(r, Value::Numeric(Decimal::from(3)));
    }

    #[test]
    fn test_integer_overflow_checked() {
        let session = LocalSession::new();
        let err = add(
            &session,
            &SqlType::TinyInt,
            &Value::TinyInt(127),
            &Value::TinyInt(1),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NumericOverflow { .. }));
    }

    #[test]
    fn test_double_to_string_round_trips() {
        let text = convert_to_string(&Value::Double(0.1)).unwrap();
        assert_eq!(text.parse::<f64>().unwrap(), 0.1);
        assert_eq!(convert_to_string(&Value::Double(0.0)).unwrap(), "0");
    }
}
