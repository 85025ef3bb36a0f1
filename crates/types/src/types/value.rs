//! SQL values
//!
//! Runtime value representations, kept separate from the type descriptors
//! that interpret them. A value does not know its declared precision or
//! collation; kernels receive both the descriptor and the value.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use silica_value::{BitString, IntervalValue, LobLocator, TimestampValue};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Numeric(Decimal),
    Double(f64),
    String(String),
    Clob(LobLocator),
    /// BINARY, VARBINARY, BIT and BIT VARYING all share the bit string shape.
    Binary(BitString),
    Blob(LobLocator),
    Date(TimestampValue),
    Time(TimestampValue),
    Timestamp(TimestampValue),
    Interval(IntervalValue),
    Array(Vec<Value>),
    Row(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::TinyInt(_) | Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_)
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Value::Numeric(_) | Value::Double(_))
    }

    /// Short representation name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(_) => "BOOLEAN",
            Value::TinyInt(_) => "TINYINT",
            Value::SmallInt(_) => "SMALLINT",
            Value::Integer(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Numeric(_) => "NUMERIC",
            Value::Double(_) => "DOUBLE",
            Value::String(_) => "CHARACTER",
            Value::Clob(_) => "CLOB",
            Value::Binary(_) => "BINARY",
            Value::Blob(_) => "BLOB",
            Value::Date(_) => "DATE",
            Value::Time(_) => "TIME",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Interval(_) => "INTERVAL",
            Value::Array(_) => "ARRAY",
            Value::Row(_) => "ROW",
        }
    }

    /// Widen any integer representation to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(*v as i64),
            Value::SmallInt(v) => Some(*v as i64),
            Value::Integer(v) => Some(*v as i64),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Exact decimal view of any exact numeric representation.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::TinyInt(v) => Some(Decimal::from(*v)),
            Value::SmallInt(v) => Some(Decimal::from(*v)),
            Value::Integer(v) => Some(Decimal::from(*v)),
            Value::BigInt(v) => Some(Decimal::from(*v)),
            Value::Numeric(d) => Some(*d),
            _ => None,
        }
    }

    /// Approximate view of any numeric representation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Numeric(d) => d.to_f64(),
            other => other.as_i64().map(|v| v as f64),
        }
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::TinyInt(v) => v.hash(state),
            Value::SmallInt(v) => v.hash(state),
            Value::Integer(v) => v.hash(state),
            Value::BigInt(v) => v.hash(state),
            Value::Numeric(d) => d.hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Clob(l) => l.hash(state),
            Value::Binary(b) => b.hash(state),
            Value::Blob(l) => l.hash(state),
            Value::Date(t) | Value::Time(t) | Value::Timestamp(t) => t.hash(state),
            Value::Interval(i) => i.hash(state),
            Value::Array(items) | Value::Row(items) => items.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Numeric(d) => write!(f, "{}", d),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Clob(l) => write!(f, "{}", l),
            Value::Binary(b) => write!(f, "{}", b),
            Value::Blob(l) => write!(f, "{}", l),
            Value::Date(t) | Value::Time(t) | Value::Timestamp(t) => {
                write!(f, "{}.{:09}", t.seconds, t.nanos)
            }
            Value::Interval(i) => write!(f, "{}", i),
            Value::Array(items) => {
                write!(f, "ARRAY[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Row(items) => {
                write!(f, "ROW(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widening() {
        assert_eq!(Value::TinyInt(5).as_i64(), Some(5));
        assert_eq!(Value::BigInt(-7).as_i64(), Some(-7));
        assert_eq!(Value::Double(1.0).as_i64(), None);
    }

    #[test]
    fn test_decimal_view() {
        assert_eq!(Value::Integer(42).as_decimal(), Some(Decimal::from(42)));
        assert_eq!(Value::Double(1.5).as_decimal(), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Null.kind_name(), "NULL");
        assert_eq!(Value::Interval(IntervalValue::Months(1)).kind_name(), "INTERVAL");
    }
}
