//! Boolean kernel
//!
//! Three-valued logic lives in the expression layer; here BOOLEAN is just a
//! comparison group of its own with FALSE < TRUE and cast-only bridges to
//! numbers and text.

use super::data_type::SqlType;
use super::value::Value;
use crate::error::{CastWarning, Error, Result};
use crate::session::SessionContext;
use std::cmp::Ordering;

pub fn compare(a: &Value, b: &Value) -> Result<Ordering> {
    match (a, b) {
        (Value::Boolean(x), Value::Boolean(y)) => Ok(x.cmp(y)),
        _ => Err(Error::IncompatibleTypes {
            left: a.kind_name().to_string(),
            right: b.kind_name().to_string(),
        }),
    }
}

/// Implicit conversion: only BOOLEAN itself converts to BOOLEAN.
pub fn convert_to_type(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Boolean(_) => Ok(value.clone()),
        other => Err(Error::IncompatibleTypes {
            left: SqlType::Boolean.name().to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

/// Explicit CAST additionally accepts numeric (non-zero is TRUE), a single
/// bit, and the literals TRUE, FALSE and UNKNOWN.
pub fn cast_to_type(
    session: &dyn SessionContext,
    value: &Value,
    _warnings: &mut Vec<CastWarning>,
) -> Result<Value> {
    match value {
        Value::Null | Value::Boolean(_) => Ok(value.clone()),
        v if v.is_integer() => Ok(Value::Boolean(v.as_i64() != Some(0))),
        Value::Numeric(d) => Ok(Value::Boolean(!d.is_zero())),
        Value::Double(v) => Ok(Value::Boolean(*v != 0.0)),
        Value::String(_) | Value::Clob(_) => {
            let text = super::character::as_text(session, value)?;
            parse_boolean(text.trim())
        }
        Value::Binary(bits) if bits.bit_length() == 1 => Ok(Value::Boolean(bits.bit(0))),
        other => Err(Error::IncompatibleTypes {
            left: SqlType::Boolean.name().to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

pub fn parse_boolean(text: &str) -> Result<Value> {
    if text.eq_ignore_ascii_case("true") {
        Ok(Value::Boolean(true))
    } else if text.eq_ignore_ascii_case("false") {
        Ok(Value::Boolean(false))
    } else if text.eq_ignore_ascii_case("unknown") {
        Ok(Value::Null)
    } else {
        Err(Error::InvalidFormat {
            expected: SqlType::Boolean.name().to_string(),
            found: text.to_string(),
        })
    }
}

pub fn convert_to_string(value: &Value) -> Result<String> {
    match value {
        Value::Boolean(true) => Ok("TRUE".to_string()),
        Value::Boolean(false) => Ok("FALSE".to_string()),
        other => Err(Error::IncompatibleTypes {
            left: SqlType::Boolean.name().to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LocalSession;

    #[test]
    fn test_false_sorts_before_true() {
        assert_eq!(
            compare(&Value::Boolean(false), &Value::Boolean(true)).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn test_implicit_rejects_numbers() {
        assert!(convert_to_type(&Value::Integer(1)).is_err());
    }

    #[test]
    fn test_cast_from_numeric_and_text() {
        let session = LocalSession::new();
        let mut w = Vec::new();
        assert_eq!(
            cast_to_type(&session, &Value::Integer(7), &mut w).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            cast_to_type(&session, &Value::Integer(0), &mut w).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            cast_to_type(&session, &Value::String("  true ".into()), &mut w).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            cast_to_type(&session, &Value::String("UNKNOWN".into()), &mut w).unwrap(),
            Value::Null
        );
        assert!(cast_to_type(&session, &Value::String("yes".into()), &mut w).is_err());
    }

    #[test]
    fn test_cast_from_single_bit() {
        use silica_value::BitString;
        let session = LocalSession::new();
        let mut w = Vec::new();
        assert_eq!(
            cast_to_type(&session, &Value::Binary(BitString::from_bits(vec![0b1000_0000], 1)), &mut w)
                .unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            cast_to_type(&session, &Value::Binary(BitString::from_bits(vec![0], 1)), &mut w)
                .unwrap(),
            Value::Boolean(false)
        );
        // Only a single bit carries a truth value.
        let two = Value::Binary(BitString::from_bits(vec![0b1100_0000], 2));
        assert!(cast_to_type(&session, &two, &mut w).is_err());
    }
}
