//! Type descriptors and dispatch
//!
//! `SqlType` is the closed set of declarable SQL types. A descriptor carries
//! everything the kernels need (precision, scale, length, collation, zone
//! flag, interval span) and every value operation enters through it:
//! comparison, conversion, casting, arithmetic, and rendering. The kernels
//! in the sibling modules own the per-family semantics.

use super::collation::Collation;
use super::interval::IntervalField;
use super::registry::{DEFAULT_NUMERIC_SCALE, MAX_NUMERIC_PRECISION, TypeCode};
use super::value::Value;
use super::{binary, boolean, character, collection, datetime, interval, number};
use crate::error::{CastWarning, Error, Result};
use crate::session::SessionContext;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Types compare only within their group; conversions across groups are the
/// kernels' business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonGroup {
    Boolean,
    Numeric,
    Character,
    Binary,
    DateTime,
    YearMonthInterval,
    DayTimeInterval,
    Array,
    Row,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Numeric {
        precision: u32,
        scale: u32,
    },
    Double,
    Char {
        length: u32,
        collation: Collation,
    },
    Varchar {
        length: u32,
        collation: Collation,
    },
    Clob {
        length: u64,
        collation: Collation,
    },
    Binary {
        length: u32,
    },
    Varbinary {
        length: u32,
    },
    Blob {
        length: u64,
    },
    Bit {
        length: u32,
    },
    BitVarying {
        length: u32,
    },
    Date,
    Time {
        scale: u32,
        with_zone: bool,
    },
    Timestamp {
        scale: u32,
        with_zone: bool,
    },
    IntervalYearMonth {
        start: IntervalField,
        end: IntervalField,
        leading: u32,
    },
    IntervalDayTime {
        start: IntervalField,
        end: IntervalField,
        leading: u32,
        fraction: u32,
    },
    Array {
        element: Box<SqlType>,
        cardinality: u32,
    },
    Row {
        fields: Vec<SqlType>,
    },
}

impl SqlType {
    pub const BOOLEAN: SqlType = SqlType::Boolean;
    pub const TINYINT: SqlType = SqlType::TinyInt;
    pub const SMALLINT: SqlType = SqlType::SmallInt;
    pub const INTEGER: SqlType = SqlType::Integer;
    pub const BIGINT: SqlType = SqlType::BigInt;
    pub const DOUBLE: SqlType = SqlType::Double;
    pub const DATE: SqlType = SqlType::Date;
    /// Catch-all NUMERIC for literals and intermediate results: full
    /// precision, with enough scale that written fractions survive limits.
    pub const NUMERIC: SqlType = SqlType::Numeric {
        precision: MAX_NUMERIC_PRECISION,
        scale: DEFAULT_NUMERIC_SCALE,
    };
    pub const VARCHAR: SqlType = SqlType::Varchar {
        length: 32_768,
        collation: Collation::DEFAULT,
    };
    pub const VARBINARY: SqlType = SqlType::Varbinary { length: 32_768 };

    pub fn comparison_group(&self) -> ComparisonGroup {
        match self {
            SqlType::Boolean => ComparisonGroup::Boolean,
            SqlType::TinyInt
            | SqlType::SmallInt
            | SqlType::Integer
            | SqlType::BigInt
            | SqlType::Numeric { .. }
            | SqlType::Double => ComparisonGroup::Numeric,
            SqlType::Char { .. } | SqlType::Varchar { .. } | SqlType::Clob { .. } => {
                ComparisonGroup::Character
            }
            SqlType::Binary { .. }
            | SqlType::Varbinary { .. }
            | SqlType::Blob { .. }
            | SqlType::Bit { .. }
            | SqlType::BitVarying { .. } => ComparisonGroup::Binary,
            SqlType::Date | SqlType::Time { .. } | SqlType::Timestamp { .. } => {
                ComparisonGroup::DateTime
            }
            SqlType::IntervalYearMonth { .. } => ComparisonGroup::YearMonthInterval,
            SqlType::IntervalDayTime { .. } => ComparisonGroup::DayTimeInterval,
            SqlType::Array { .. } => ComparisonGroup::Array,
            SqlType::Row { .. } => ComparisonGroup::Row,
        }
    }

    pub fn type_code(&self) -> TypeCode {
        match self {
            SqlType::Boolean => TypeCode::Boolean,
            SqlType::TinyInt => TypeCode::TinyInt,
            SqlType::SmallInt => TypeCode::SmallInt,
            SqlType::Integer => TypeCode::Integer,
            SqlType::BigInt => TypeCode::BigInt,
            SqlType::Numeric { .. } => TypeCode::Numeric,
            SqlType::Double => TypeCode::Double,
            SqlType::Char { .. } => TypeCode::Char,
            SqlType::Varchar { .. } => TypeCode::Varchar,
            SqlType::Clob { .. } => TypeCode::Clob,
            SqlType::Binary { .. } => TypeCode::Binary,
            SqlType::Varbinary { .. } => TypeCode::Varbinary,
            SqlType::Blob { .. } => TypeCode::Blob,
            SqlType::Bit { .. } => TypeCode::Bit,
            SqlType::BitVarying { .. } => TypeCode::BitVarying,
            SqlType::Date => TypeCode::Date,
            SqlType::Time { with_zone, .. } => {
                if *with_zone {
                    TypeCode::TimeWithZone
                } else {
                    TypeCode::Time
                }
            }
            SqlType::Timestamp { with_zone, .. } => {
                if *with_zone {
                    TypeCode::TimestampWithZone
                } else {
                    TypeCode::Timestamp
                }
            }
            SqlType::IntervalYearMonth { start, end, .. }
            | SqlType::IntervalDayTime { start, end, .. } => interval_code(*start, *end),
            SqlType::Array { .. } => TypeCode::Array,
            SqlType::Row { .. } => TypeCode::Row,
        }
    }

    /// Keyword name without parameters.
    pub fn name(&self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::TinyInt => "TINYINT",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Numeric { .. } => "NUMERIC",
            SqlType::Double => "DOUBLE",
            SqlType::Char { .. } => "CHARACTER",
            SqlType::Varchar { .. } => "VARCHAR",
            SqlType::Clob { .. } => "CLOB",
            SqlType::Binary { .. } => "BINARY",
            SqlType::Varbinary { .. } => "VARBINARY",
            SqlType::Blob { .. } => "BLOB",
            SqlType::Bit { .. } => "BIT",
            SqlType::BitVarying { .. } => "BIT VARYING",
            SqlType::Date => "DATE",
            SqlType::Time {
                with_zone: false, ..
            } => "TIME",
            SqlType::Time {
                with_zone: true, ..
            } => "TIME WITH TIME ZONE",
            SqlType::Timestamp {
                with_zone: false, ..
            } => "TIMESTAMP",
            SqlType::Timestamp {
                with_zone: true, ..
            } => "TIMESTAMP WITH TIME ZONE",
            SqlType::IntervalYearMonth { .. } | SqlType::IntervalDayTime { .. } => "INTERVAL",
            SqlType::Array { .. } => "ARRAY",
            SqlType::Row { .. } => "ROW",
        }
    }

    /// Full declaration form, parameters included.
    pub fn full_name(&self) -> String {
        match self {
            SqlType::Numeric { precision, scale } => {
                format!("NUMERIC({},{})", precision, scale)
            }
            SqlType::Char { length, .. } => format!("CHARACTER({})", length),
            SqlType::Varchar { length, .. } => format!("VARCHAR({})", length),
            SqlType::Clob { length, .. } => format!("CLOB({})", length),
            SqlType::Binary { length } => format!("BINARY({})", length),
            SqlType::Varbinary { length } => format!("VARBINARY({})", length),
            SqlType::Blob { length } => format!("BLOB({})", length),
            SqlType::Bit { length } => format!("BIT({})", length),
            SqlType::BitVarying { length } => format!("BIT VARYING({})", length),
            SqlType::Time { scale, with_zone } => {
                let zone = if *with_zone { " WITH TIME ZONE" } else { "" };
                format!("TIME({}){}", scale, zone)
            }
            SqlType::Timestamp { scale, with_zone } => {
                let zone = if *with_zone { " WITH TIME ZONE" } else { "" };
                format!("TIMESTAMP({}){}", scale, zone)
            }
            SqlType::IntervalYearMonth {
                start,
                end,
                leading,
            } => {
                if start == end {
                    format!("INTERVAL {}({})", start.name(), leading)
                } else {
                    format!("INTERVAL {}({}) TO {}", start.name(), leading, end.name())
                }
            }
            SqlType::IntervalDayTime {
                start,
                end,
                leading,
                fraction,
            } => {
                if start == end && *start == IntervalField::Second {
                    format!("INTERVAL SECOND({},{})", leading, fraction)
                } else if start == end {
                    format!("INTERVAL {}({})", start.name(), leading)
                } else if *end == IntervalField::Second {
                    format!(
                        "INTERVAL {}({}) TO SECOND({})",
                        start.name(),
                        leading,
                        fraction
                    )
                } else {
                    format!("INTERVAL {}({}) TO {}", start.name(), leading, end.name())
                }
            }
            SqlType::Array {
                element,
                cardinality,
            } => format!("{} ARRAY[{}]", element.full_name(), cardinality),
            SqlType::Row { fields } => {
                let inner: Vec<String> = fields.iter().map(|f| f.full_name()).collect();
                format!("ROW({})", inner.join(", "))
            }
            other => other.name().to_string(),
        }
    }

    pub fn precision(&self) -> u64 {
        match self {
            SqlType::TinyInt => 3,
            SqlType::SmallInt => 5,
            SqlType::Integer => 10,
            SqlType::BigInt => 19,
            SqlType::Numeric { precision, .. } => *precision as u64,
            SqlType::Double => 15,
            SqlType::Char { length, .. } | SqlType::Varchar { length, .. } => *length as u64,
            SqlType::Clob { length, .. } | SqlType::Blob { length } => *length,
            SqlType::Binary { length }
            | SqlType::Varbinary { length }
            | SqlType::Bit { length }
            | SqlType::BitVarying { length } => *length as u64,
            SqlType::IntervalYearMonth { leading, .. }
            | SqlType::IntervalDayTime { leading, .. } => *leading as u64,
            _ => 0,
        }
    }

    pub fn scale(&self) -> u32 {
        match self {
            SqlType::Numeric { scale, .. } => *scale,
            SqlType::Time { scale, .. } | SqlType::Timestamp { scale, .. } => *scale,
            SqlType::IntervalDayTime { fraction, .. } => *fraction,
            _ => 0,
        }
    }

    /// Characters needed to render any value of this type.
    pub fn display_size(&self) -> u32 {
        match self {
            SqlType::Boolean => 5,
            SqlType::TinyInt => 4,
            SqlType::SmallInt => 6,
            SqlType::Integer => 11,
            SqlType::BigInt => 20,
            SqlType::Numeric { precision, .. } => precision + 2,
            SqlType::Double => 23,
            SqlType::Char { length, .. } | SqlType::Varchar { length, .. } => *length,
            SqlType::Clob { length, .. } => (*length).min(u32::MAX as u64) as u32,
            SqlType::Binary { length } | SqlType::Varbinary { length } => {
                length.saturating_mul(2)
            }
            SqlType::Blob { length } => (*length).min(u32::MAX as u64 / 2) as u32 * 2,
            SqlType::Bit { length } | SqlType::BitVarying { length } => *length,
            SqlType::Date => 10,
            SqlType::Time { scale, with_zone } => {
                8 + fraction_width(*scale) + zone_width(*with_zone)
            }
            SqlType::Timestamp { scale, with_zone } => {
                19 + fraction_width(*scale) + zone_width(*with_zone)
            }
            SqlType::IntervalYearMonth { leading, .. } => leading + 4,
            SqlType::IntervalDayTime {
                leading, fraction, ..
            } => leading + 10 + fraction_width(*fraction),
            SqlType::Array { .. } | SqlType::Row { .. } => 0,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.comparison_group() == ComparisonGroup::Numeric
    }

    pub fn is_exact_numeric(&self) -> bool {
        self.is_numeric() && !matches!(self, SqlType::Double)
    }

    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt
        )
    }

    pub fn is_character(&self) -> bool {
        self.comparison_group() == ComparisonGroup::Character
    }

    pub fn is_binary(&self) -> bool {
        self.comparison_group() == ComparisonGroup::Binary
    }

    pub fn is_datetime(&self) -> bool {
        self.comparison_group() == ComparisonGroup::DateTime
    }

    pub fn is_interval(&self) -> bool {
        matches!(
            self.comparison_group(),
            ComparisonGroup::YearMonthInterval | ComparisonGroup::DayTimeInterval
        )
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, SqlType::Array { .. } | SqlType::Row { .. })
    }

    pub fn is_lob(&self) -> bool {
        matches!(self, SqlType::Clob { .. } | SqlType::Blob { .. })
    }

    pub fn collation(&self) -> Option<Collation> {
        match self {
            SqlType::Char { collation, .. }
            | SqlType::Varchar { collation, .. }
            | SqlType::Clob { collation, .. } => Some(*collation),
            _ => None,
        }
    }

    /// Total ordering of two non-null values of this type. NULL inputs sort
    /// first; dedicated null placement lives in [`super::sort::RowComparator`].
    pub fn compare(&self, session: &dyn SessionContext, a: &Value, b: &Value) -> Result<Ordering> {
        match (a.is_null(), b.is_null()) {
            (true, true) => return Ok(Ordering::Equal),
            (true, false) => return Ok(Ordering::Less),
            (false, true) => return Ok(Ordering::Greater),
            (false, false) => {}
        }
        match self {
            SqlType::Boolean => boolean::compare(a, b),
            _ if self.is_numeric() => number::compare(a, b),
            _ if self.is_character() => {
                let collation = self.collation().unwrap_or_default();
                character::compare(session, &collation, a, b)
            }
            _ if self.is_binary() => binary::compare(session, a, b),
            _ if self.is_datetime() => datetime::compare(a, b),
            _ if self.is_interval() => interval::compare(a, b),
            SqlType::Array { element, .. } => {
                collection::compare_arrays(session, element, a, b)
            }
            SqlType::Row { fields } => collection::compare_rows(session, fields, a, b),
            _ => unreachable!(),
        }
    }

    /// Implicit conversion of `value` (typed by `source`) into this type.
    pub fn convert_to_type(
        &self,
        session: &dyn SessionContext,
        value: &Value,
        source: &SqlType,
    ) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            SqlType::Boolean => boolean::convert_to_type(value),
            _ if self.is_numeric() => number::convert_to_type(session, self, value, source),
            _ if self.is_character() => {
                character::convert_to_type(session, self, value, source)
            }
            _ if self.is_binary() => binary::convert_to_type(session, self, value, source),
            _ if self.is_datetime() => datetime::convert_to_type(session, self, value, source),
            _ if self.is_interval() => interval::convert_to_type(session, self, value, source),
            _ => collection::convert_to_type(session, self, value, source),
        }
    }

    /// Explicit CAST. Wider than implicit conversion: boolean bridges,
    /// hex text to binary, and lossy truncation are allowed, the latter
    /// reported through `warnings`.
    pub fn cast_to_type(
        &self,
        session: &dyn SessionContext,
        value: &Value,
        source: &SqlType,
        warnings: &mut Vec<CastWarning>,
    ) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            SqlType::Boolean => boolean::cast_to_type(session, value, warnings),
            _ if self.is_numeric() => {
                number::cast_to_type(session, self, value, source, warnings)
            }
            _ if self.is_character() => {
                character::cast_to_type(session, self, value, source, warnings)
            }
            _ if self.is_binary() => {
                binary::cast_to_type(session, self, value, source, warnings)
            }
            _ if self.is_datetime() => {
                datetime::cast_to_type(session, self, value, source, warnings)
            }
            _ if self.is_interval() => {
                interval::cast_to_type(session, self, value, source, warnings)
            }
            _ => collection::cast_to_type(session, self, value, source, warnings),
        }
    }

    /// Re-check a value of this type against its own declaration; used on
    /// store. Idempotent.
    pub fn convert_to_type_limits(
        &self,
        session: &dyn SessionContext,
        value: &Value,
    ) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            SqlType::Boolean => boolean::convert_to_type(value),
            _ if self.is_numeric() => number::convert_to_type_limits(session, self, value),
            _ if self.is_character() => {
                character::convert_to_type_limits(session, self, value)
            }
            _ if self.is_binary() => binary::convert_to_type_limits(session, self, value),
            _ if self.is_datetime() => datetime::convert_to_type_limits(self, value),
            _ if self.is_interval() => interval::convert_to_type_limits(self, value),
            _ => collection::convert_to_type_limits(session, self, value),
        }
    }

    pub fn convert_to_string(&self, session: &dyn SessionContext, value: &Value) -> Result<String> {
        match self {
            SqlType::Boolean => boolean::convert_to_string(value),
            _ if self.is_numeric() => number::convert_to_string(value),
            _ if self.is_character() => character::convert_to_string(session, value),
            _ if self.is_binary() => binary::convert_to_string(session, value),
            _ if self.is_datetime() => datetime::convert_to_string(session, self, value),
            _ if self.is_interval() => interval::convert_to_string(self, value),
            _ => collection::convert_to_string(session, self, value),
        }
    }

    /// SQL literal form, quoted and prefixed as the grammar requires.
    pub fn convert_to_sql_string(
        &self,
        session: &dyn SessionContext,
        value: &Value,
    ) -> Result<String> {
        if value.is_null() {
            return Ok("NULL".to_string());
        }
        match self {
            _ if self.is_character() => character::convert_to_sql_string(session, value),
            _ if self.is_binary() => binary::convert_to_sql_string(session, value),
            _ if self.is_datetime() => datetime::convert_to_sql_string(session, self, value),
            _ if self.is_interval() => interval::convert_to_sql_string(self, value),
            _ => self.convert_to_string(session, value),
        }
    }

    /// Whether an explicit CAST from `source` to this type can succeed for
    /// some value.
    pub fn can_convert_from(&self, source: &SqlType) -> bool {
        use ComparisonGroup::*;
        let (to, from) = (self.comparison_group(), source.comparison_group());
        if to == from {
            return true;
        }
        match (to, from) {
            // Everything renders to text; text parses to any scalar.
            (Character, _) => true,
            (Array | Row, Character) => false,
            (_, Character) => true,
            (Boolean, Numeric) | (Numeric, Boolean) => true,
            // A single bit carries a truth value.
            (Boolean, Binary) => matches!(
                source,
                SqlType::Bit { length: 1 } | SqlType::BitVarying { .. }
            ),
            (Binary, Boolean) => {
                matches!(self, SqlType::Bit { .. } | SqlType::BitVarying { .. })
            }
            (Numeric, YearMonthInterval | DayTimeInterval) => {
                matches!(single_field_span(source), Some(true))
            }
            (YearMonthInterval | DayTimeInterval, Numeric) => {
                matches!(single_field_span(self), Some(true))
            }
            _ => false,
        }
    }

    /// Least common type of this and `other`, for UNION columns and CASE
    /// branches. Widening only: any value of either type fits the result.
    pub fn get_aggregate_type(&self, other: &SqlType) -> Result<SqlType> {
        if self == other {
            return Ok(self.clone());
        }
        use ComparisonGroup::*;
        let (l, r) = (self.comparison_group(), other.comparison_group());
        match (l, r) {
            (Character, _) | (_, Character) => character::get_aggregate_type(self, other),
            (Numeric, Numeric) => number::get_aggregate_type(self, other),
            (Binary, Binary) => binary::get_aggregate_type(self, other),
            (DateTime, DateTime) => datetime::get_aggregate_type(self, other),
            (YearMonthInterval, YearMonthInterval) | (DayTimeInterval, DayTimeInterval) => {
                interval::get_aggregate_type(self, other)
            }
            (Array, Array) | (Row, Row) => collection::get_aggregate_type(self, other),
            (Boolean, Boolean) => Ok(SqlType::Boolean),
            _ => Err(Error::IncompatibleTypes {
                left: self.name().to_string(),
                right: other.name().to_string(),
            }),
        }
    }

    /// Result type of `self <op> other`.
    pub fn get_combined_type(&self, other: &SqlType, op: OperatorKind) -> Result<SqlType> {
        let incompatible = || Error::IncompatibleTypes {
            left: self.name().to_string(),
            right: other.name().to_string(),
        };
        match op {
            OperatorKind::Concat => {
                if self.is_character() && other.is_character() {
                    character::get_combined_type(self, other)
                } else if self.is_binary() && other.is_binary() {
                    binary::get_combined_type(self, other)
                } else if let (
                    SqlType::Array {
                        cardinality: c1, ..
                    },
                    SqlType::Array {
                        cardinality: c2, ..
                    },
                ) = (self, other)
                {
                    // Concatenated arrays need room for both operands.
                    let merged = collection::get_aggregate_type(self, other)?;
                    match merged {
                        SqlType::Array { element, .. } => Ok(SqlType::Array {
                            element,
                            cardinality: c1.saturating_add(*c2),
                        }),
                        other => Ok(other),
                    }
                } else {
                    Err(incompatible())
                }
            }
            OperatorKind::Add | OperatorKind::Subtract => {
                if self.is_numeric() && other.is_numeric() {
                    number::get_combined_type(self, other, op)
                } else if self.is_datetime() && other.is_interval() {
                    Ok(self.clone())
                } else if self.is_interval() && other.is_datetime() && op == OperatorKind::Add {
                    Ok(other.clone())
                } else if self.is_interval() && other.is_interval() {
                    interval::get_aggregate_type(self, other)
                } else if self.is_interval() && other.is_numeric()
                    || self.is_numeric() && other.is_interval()
                {
                    // Numbers act as single-field interval counts.
                    let iv = if self.is_interval() { self } else { other };
                    Ok(iv.clone())
                } else {
                    Err(incompatible())
                }
            }
            OperatorKind::Multiply | OperatorKind::Divide => {
                if self.is_numeric() && other.is_numeric() {
                    number::get_combined_type(self, other, op)
                } else if self.is_interval() && other.is_numeric() {
                    Ok(self.clone())
                } else if self.is_numeric() && other.is_interval() && op == OperatorKind::Multiply
                {
                    Ok(other.clone())
                } else {
                    Err(incompatible())
                }
            }
        }
    }

    /// `a + b` evaluated at this (result) type.
    pub fn add(&self, session: &dyn SessionContext, a: &Value, b: &Value) -> Result<Value> {
        match self {
            _ if self.is_numeric() => number::add(session, self, a, b),
            _ if self.is_datetime() => {
                let (dt, iv) = split_datetime_interval(a, b)?;
                datetime::add_interval(session, self, dt, iv, false)
            }
            _ if self.is_interval() => interval::add(self, a, b),
            _ => Err(Error::IncompatibleTypes {
                left: self.name().to_string(),
                right: a.kind_name().to_string(),
            }),
        }
    }

    /// `a - b` evaluated at this (result) type. With an interval result and
    /// two datetime operands this is datetime subtraction.
    pub fn subtract(&self, session: &dyn SessionContext, a: &Value, b: &Value) -> Result<Value> {
        match self {
            _ if self.is_numeric() => number::subtract(session, self, a, b),
            _ if self.is_datetime() => match b {
                Value::Interval(iv) => datetime::add_interval(session, self, a, iv, true),
                other => Err(Error::IncompatibleTypes {
                    left: self.name().to_string(),
                    right: other.kind_name().to_string(),
                }),
            },
            _ if self.is_interval() => {
                if matches!(a, Value::Date(_) | Value::Time(_) | Value::Timestamp(_)) {
                    let year_month =
                        self.comparison_group() == ComparisonGroup::YearMonthInterval;
                    let diff = datetime::between(session, a, b, year_month)?;
                    self.convert_to_type_limits(session, &Value::Interval(diff))
                } else {
                    interval::subtract(self, a, b)
                }
            }
            _ => Err(Error::IncompatibleTypes {
                left: self.name().to_string(),
                right: a.kind_name().to_string(),
            }),
        }
    }

    pub fn multiply(&self, session: &dyn SessionContext, a: &Value, b: &Value) -> Result<Value> {
        match self {
            _ if self.is_numeric() => number::multiply(session, self, a, b),
            _ if self.is_interval() => {
                let (iv, factor) = if matches!(a, Value::Interval(_)) {
                    (a, b)
                } else {
                    (b, a)
                };
                interval::multiply(self, iv, factor)
            }
            _ => Err(Error::IncompatibleTypes {
                left: self.name().to_string(),
                right: a.kind_name().to_string(),
            }),
        }
    }

    pub fn divide(&self, session: &dyn SessionContext, a: &Value, b: &Value) -> Result<Value> {
        match self {
            _ if self.is_numeric() => number::divide(session, self, a, b),
            _ if self.is_interval() => interval::divide(self, a, b),
            _ => Err(Error::IncompatibleTypes {
                left: self.name().to_string(),
                right: a.kind_name().to_string(),
            }),
        }
    }

    pub fn negate(&self, value: &Value) -> Result<Value> {
        match self {
            _ if self.is_numeric() => number::negate(self, value),
            _ if self.is_interval() => interval::negate(self, value),
            _ => Err(Error::IncompatibleTypes {
                left: self.name().to_string(),
                right: value.kind_name().to_string(),
            }),
        }
    }

    /// `a || b` evaluated at this (result) type.
    pub fn concat(&self, session: &dyn SessionContext, a: &Value, b: &Value) -> Result<Value> {
        if a.is_null() || b.is_null() {
            return Ok(Value::Null);
        }
        match self {
            _ if self.is_character() => {
                let joined = format!(
                    "{}{}",
                    character::as_text(session, a)?,
                    character::as_text(session, b)?
                );
                character::convert_to_type_limits(session, self, &Value::String(joined))
            }
            _ if self.is_binary() => {
                let joined = binary::concat(session, a, b)?;
                binary::convert_to_type_limits(session, self, &joined)
            }
            SqlType::Array { .. } => collection::concat_arrays(self, a, b),
            _ => Err(Error::IncompatibleTypes {
                left: self.name().to_string(),
                right: a.kind_name().to_string(),
            }),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

fn split_datetime_interval<'a>(
    a: &'a Value,
    b: &'a Value,
) -> Result<(&'a Value, &'a silica_value::IntervalValue)> {
    match (a, b) {
        (dt, Value::Interval(iv))
            if matches!(dt, Value::Date(_) | Value::Time(_) | Value::Timestamp(_)) =>
        {
            Ok((dt, iv))
        }
        (Value::Interval(iv), dt)
            if matches!(dt, Value::Date(_) | Value::Time(_) | Value::Timestamp(_)) =>
        {
            Ok((dt, iv))
        }
        _ => Err(Error::IncompatibleTypes {
            left: a.kind_name().to_string(),
            right: b.kind_name().to_string(),
        }),
    }
}

fn single_field_span(ty: &SqlType) -> Option<bool> {
    match ty {
        SqlType::IntervalYearMonth { start, end, .. } => Some(start == end),
        SqlType::IntervalDayTime { start, end, .. } => Some(start == end),
        _ => None,
    }
}

fn interval_code(start: IntervalField, end: IntervalField) -> TypeCode {
    use IntervalField::*;
    match (start, end) {
        (Year, Year) => TypeCode::IntervalYear,
        (Year, _) => TypeCode::IntervalYearToMonth,
        (Month, _) => TypeCode::IntervalMonth,
        (Day, Day) => TypeCode::IntervalDay,
        (Day, Hour) => TypeCode::IntervalDayToHour,
        (Day, Minute) => TypeCode::IntervalDayToMinute,
        (Day, _) => TypeCode::IntervalDayToSecond,
        (Hour, Hour) => TypeCode::IntervalHour,
        (Hour, Minute) => TypeCode::IntervalHourToMinute,
        (Hour, _) => TypeCode::IntervalHourToSecond,
        (Minute, Minute) => TypeCode::IntervalMinute,
        (Minute, _) => TypeCode::IntervalMinuteToSecond,
        (Second, _) => TypeCode::IntervalSecond,
    }
}

fn fraction_width(scale: u32) -> u32 {
    if scale == 0 { 0 } else { scale + 1 }
}

fn zone_width(with_zone: bool) -> u32 {
    if with_zone { 6 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LocalSession;
    use rust_decimal::Decimal;

    #[test]
    fn test_comparison_groups_partition_types() {
        assert_eq!(
            SqlType::Integer.comparison_group(),
            SqlType::Double.comparison_group()
        );
        assert_ne!(
            SqlType::VARCHAR.comparison_group(),
            SqlType::VARBINARY.comparison_group()
        );
        let ym = SqlType::IntervalYearMonth {
            start: IntervalField::Year,
            end: IntervalField::Month,
            leading: 2,
        };
        let dt = SqlType::IntervalDayTime {
            start: IntervalField::Day,
            end: IntervalField::Second,
            leading: 2,
            fraction: 6,
        };
        assert_ne!(ym.comparison_group(), dt.comparison_group());
    }

    #[test]
    fn test_cross_group_compare_fails() {
        let session = LocalSession::new();
        let err = SqlType::Integer
            .compare(&session, &Value::Integer(1), &Value::String("1".into()))
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleTypes { .. }));
    }

    #[test]
    fn test_mixed_representation_compare() {
        let session = LocalSession::new();
        // INTEGER column holding a value compared against a NUMERIC literal.
        let ord = SqlType::NUMERIC
            .compare(
                &session,
                &Value::Integer(2),
                &Value::Numeric("1.5".parse().unwrap()),
            )
            .unwrap();
        assert_eq!(ord, Ordering::Greater);
    }

    #[test]
    fn test_full_names() {
        assert_eq!(
            SqlType::Numeric {
                precision: 10,
                scale: 2
            }
            .full_name(),
            "NUMERIC(10,2)"
        );
        let iv = SqlType::IntervalDayTime {
            start: IntervalField::Day,
            end: IntervalField::Second,
            leading: 3,
            fraction: 6,
        };
        assert_eq!(iv.full_name(), "INTERVAL DAY(3) TO SECOND(6)");
    }

    #[test]
    fn test_can_convert_matrix() {
        assert!(SqlType::VARCHAR.can_convert_from(&SqlType::Integer));
        assert!(SqlType::Integer.can_convert_from(&SqlType::VARCHAR));
        assert!(SqlType::Boolean.can_convert_from(&SqlType::Integer));
        assert!(!SqlType::Date.can_convert_from(&SqlType::Integer));
        assert!(!SqlType::VARBINARY.can_convert_from(&SqlType::Integer));

        assert!(SqlType::Boolean.can_convert_from(&SqlType::Bit { length: 1 }));
        assert!(SqlType::Bit { length: 1 }.can_convert_from(&SqlType::Boolean));
        assert!(!SqlType::Boolean.can_convert_from(&SqlType::Bit { length: 2 }));
        assert!(!SqlType::VARBINARY.can_convert_from(&SqlType::Boolean));

        let months = SqlType::IntervalYearMonth {
            start: IntervalField::Month,
            end: IntervalField::Month,
            leading: 2,
        };
        assert!(SqlType::Integer.can_convert_from(&months));
        let span = SqlType::IntervalYearMonth {
            start: IntervalField::Year,
            end: IntervalField::Month,
            leading: 2,
        };
        assert!(!SqlType::Integer.can_convert_from(&span));
    }

    #[test]
    fn test_combined_type_datetime_interval() {
        let ts = SqlType::Timestamp {
            scale: 6,
            with_zone: false,
        };
        let iv = SqlType::IntervalDayTime {
            start: IntervalField::Day,
            end: IntervalField::Second,
            leading: 2,
            fraction: 6,
        };
        assert_eq!(ts.get_combined_type(&iv, OperatorKind::Add).unwrap(), ts);
        assert_eq!(iv.get_combined_type(&ts, OperatorKind::Add).unwrap(), ts);
        assert!(iv.get_combined_type(&ts, OperatorKind::Subtract).is_err());
        assert_eq!(
            iv.get_combined_type(&SqlType::Integer, OperatorKind::Multiply)
                .unwrap(),
            iv
        );
    }

    #[test]
    fn test_arithmetic_dispatch() {
        let session = LocalSession::new();
        let sum = SqlType::Integer
            .add(&session, &Value::SmallInt(3), &Value::SmallInt(4))
            .unwrap();
        assert_eq!(sum, Value::Integer(7));

        let product = SqlType::NUMERIC
            .multiply(
                &session,
                &Value::Numeric(Decimal::from(6)),
                &Value::Integer(7),
            )
            .unwrap();
        assert_eq!(product, Value::Numeric(Decimal::from(42)));
    }

    #[test]
    fn test_aggregate_type_is_commutative_here() {
        let a = SqlType::Numeric {
            precision: 6,
            scale: 2,
        };
        let b = SqlType::Integer;
        assert_eq!(
            a.get_aggregate_type(&b).unwrap(),
            b.get_aggregate_type(&a).unwrap()
        );
    }

    #[test]
    fn test_null_propagates_through_conversion() {
        let session = LocalSession::new();
        assert_eq!(
            SqlType::Integer
                .convert_to_type(&session, &Value::Null, &SqlType::VARCHAR)
                .unwrap(),
            Value::Null
        );
    }
}
