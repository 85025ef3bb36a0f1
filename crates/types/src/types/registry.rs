//! Type factory
//!
//! Numeric type codes, declaration envelope constants, and the constructors
//! the DDL layer goes through. Construction validates the declaration
//! (precision, scale, spans, cardinality) once, so the kernels can trust
//! every descriptor they see.

use super::collation::Collation;
use super::data_type::SqlType;
use super::interval::IntervalField;
use crate::error::{Error, Result};

/// Largest exact numeric precision the backing decimal can hold.
pub const MAX_NUMERIC_PRECISION: u32 = 28;
pub const DEFAULT_NUMERIC_PRECISION: u32 = 18;
/// Scale of the catch-all NUMERIC used for literals and intermediates.
/// Half the precision envelope, so both wide integers and long fractions fit.
pub const DEFAULT_NUMERIC_SCALE: u32 = 14;
pub const MAX_STRING_LENGTH: u32 = 16_777_216;
pub const DEFAULT_CHAR_LENGTH: u32 = 1;
pub const DEFAULT_VARCHAR_LENGTH: u32 = 32_768;
pub const MAX_BINARY_LENGTH: u32 = 16_777_216;
pub const MAX_BIT_LENGTH: u32 = MAX_BINARY_LENGTH.saturating_mul(8);
pub const DEFAULT_LOB_LENGTH: u64 = 1 << 30;
pub const MAX_DATETIME_SCALE: u32 = 9;
pub const DEFAULT_TIME_SCALE: u32 = 0;
pub const DEFAULT_TIMESTAMP_SCALE: u32 = 6;
pub const MAX_INTERVAL_LEADING: u32 = 9;
pub const DEFAULT_INTERVAL_LEADING: u32 = 2;
pub const MAX_INTERVAL_FRACTION: u32 = 9;
pub const DEFAULT_INTERVAL_FRACTION: u32 = 6;
pub const MAX_ARRAY_CARDINALITY: u32 = 1 << 24;
pub const DEFAULT_ARRAY_CARDINALITY: u32 = 1024;

/// Stable identifier of each declarable type shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Boolean,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Numeric,
    Double,
    Char,
    Varchar,
    Clob,
    Binary,
    Varbinary,
    Blob,
    Bit,
    BitVarying,
    Date,
    Time,
    TimeWithZone,
    Timestamp,
    TimestampWithZone,
    IntervalYear,
    IntervalMonth,
    IntervalYearToMonth,
    IntervalDay,
    IntervalHour,
    IntervalMinute,
    IntervalSecond,
    IntervalDayToHour,
    IntervalDayToMinute,
    IntervalDayToSecond,
    IntervalHourToMinute,
    IntervalHourToSecond,
    IntervalMinuteToSecond,
    Array,
    Row,
}

impl TypeCode {
    pub fn from_name(name: &str) -> Option<TypeCode> {
        let folded = name.trim().to_ascii_uppercase();
        Some(match folded.as_str() {
            "BOOLEAN" => TypeCode::Boolean,
            "TINYINT" => TypeCode::TinyInt,
            "SMALLINT" => TypeCode::SmallInt,
            "INTEGER" | "INT" => TypeCode::Integer,
            "BIGINT" => TypeCode::BigInt,
            "NUMERIC" | "DECIMAL" | "DEC" => TypeCode::Numeric,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT" | "REAL" => TypeCode::Double,
            "CHAR" | "CHARACTER" => TypeCode::Char,
            "VARCHAR" | "CHARACTER VARYING" | "CHAR VARYING" => TypeCode::Varchar,
            "CLOB" | "CHARACTER LARGE OBJECT" => TypeCode::Clob,
            "BINARY" => TypeCode::Binary,
            "VARBINARY" | "BINARY VARYING" => TypeCode::Varbinary,
            "BLOB" | "BINARY LARGE OBJECT" => TypeCode::Blob,
            "BIT" => TypeCode::Bit,
            "BIT VARYING" => TypeCode::BitVarying,
            "DATE" => TypeCode::Date,
            "TIME" => TypeCode::Time,
            "TIME WITH TIME ZONE" => TypeCode::TimeWithZone,
            "TIMESTAMP" => TypeCode::Timestamp,
            "TIMESTAMP WITH TIME ZONE" => TypeCode::TimestampWithZone,
            "INTERVAL YEAR" => TypeCode::IntervalYear,
            "INTERVAL MONTH" => TypeCode::IntervalMonth,
            "INTERVAL YEAR TO MONTH" => TypeCode::IntervalYearToMonth,
            "INTERVAL DAY" => TypeCode::IntervalDay,
            "INTERVAL HOUR" => TypeCode::IntervalHour,
            "INTERVAL MINUTE" => TypeCode::IntervalMinute,
            "INTERVAL SECOND" => TypeCode::IntervalSecond,
            "INTERVAL DAY TO HOUR" => TypeCode::IntervalDayToHour,
            "INTERVAL DAY TO MINUTE" => TypeCode::IntervalDayToMinute,
            "INTERVAL DAY TO SECOND" => TypeCode::IntervalDayToSecond,
            "INTERVAL HOUR TO MINUTE" => TypeCode::IntervalHourToMinute,
            "INTERVAL HOUR TO SECOND" => TypeCode::IntervalHourToSecond,
            "INTERVAL MINUTE TO SECOND" => TypeCode::IntervalMinuteToSecond,
            "ARRAY" => TypeCode::Array,
            "ROW" => TypeCode::Row,
            _ => return None,
        })
    }
}

/// Build a type from its code and declared precision/scale, applying the
/// SQL defaults when the declaration omits them (precision 0).
pub fn get_type(code: TypeCode, precision: u64, scale: u32) -> Result<SqlType> {
    match code {
        TypeCode::Boolean => Ok(SqlType::Boolean),
        TypeCode::TinyInt => Ok(SqlType::TinyInt),
        TypeCode::SmallInt => Ok(SqlType::SmallInt),
        TypeCode::Integer => Ok(SqlType::Integer),
        TypeCode::BigInt => Ok(SqlType::BigInt),
        TypeCode::Double => Ok(SqlType::Double),
        TypeCode::Numeric => {
            let precision = if precision == 0 {
                DEFAULT_NUMERIC_PRECISION
            } else {
                check_max(precision, MAX_NUMERIC_PRECISION as u64, "NUMERIC precision")? as u32
            };
            if scale > precision {
                return Err(Error::InvalidValue(format!(
                    "NUMERIC scale {} exceeds precision {}",
                    scale, precision
                )));
            }
            Ok(SqlType::Numeric { precision, scale })
        }
        TypeCode::Char | TypeCode::Varchar => {
            get_char_type(code, precision, Collation::DEFAULT)
        }
        TypeCode::Clob => {
            let length = if precision == 0 {
                DEFAULT_LOB_LENGTH
            } else {
                precision
            };
            Ok(SqlType::Clob {
                length,
                collation: Collation::DEFAULT,
            })
        }
        TypeCode::Binary | TypeCode::Varbinary => {
            let length = if precision == 0 {
                1
            } else {
                check_max(precision, MAX_BINARY_LENGTH as u64, "binary length")? as u32
            };
            Ok(if code == TypeCode::Binary {
                SqlType::Binary { length }
            } else {
                SqlType::Varbinary { length }
            })
        }
        TypeCode::Bit | TypeCode::BitVarying => {
            let length = if precision == 0 {
                1
            } else {
                check_max(precision, MAX_BIT_LENGTH as u64, "bit length")? as u32
            };
            Ok(if code == TypeCode::Bit {
                SqlType::Bit { length }
            } else {
                SqlType::BitVarying { length }
            })
        }
        TypeCode::Blob => {
            let length = if precision == 0 {
                DEFAULT_LOB_LENGTH
            } else {
                precision
            };
            Ok(SqlType::Blob { length })
        }
        TypeCode::Date => Ok(SqlType::Date),
        TypeCode::Time | TypeCode::TimeWithZone => {
            let scale = datetime_scale(precision, DEFAULT_TIME_SCALE)?;
            Ok(SqlType::Time {
                scale,
                with_zone: code == TypeCode::TimeWithZone,
            })
        }
        TypeCode::Timestamp | TypeCode::TimestampWithZone => {
            let scale = datetime_scale(precision, DEFAULT_TIMESTAMP_SCALE)?;
            Ok(SqlType::Timestamp {
                scale,
                with_zone: code == TypeCode::TimestampWithZone,
            })
        }
        TypeCode::Array | TypeCode::Row => Err(Error::InvalidValue(format!(
            "{:?} requires element types",
            code
        ))),
        interval => {
            let (start, end) = interval_span(interval)?;
            let leading = if precision == 0 {
                DEFAULT_INTERVAL_LEADING
            } else {
                precision as u32
            };
            let fraction = if end == IntervalField::Second && scale == 0 {
                DEFAULT_INTERVAL_FRACTION
            } else {
                scale
            };
            get_interval_type(start, end, leading, fraction)
        }
    }
}

pub fn get_char_type(code: TypeCode, length: u64, collation: Collation) -> Result<SqlType> {
    match code {
        TypeCode::Char => {
            let length = if length == 0 {
                DEFAULT_CHAR_LENGTH
            } else {
                check_max(length, MAX_STRING_LENGTH as u64, "CHAR length")? as u32
            };
            Ok(SqlType::Char { length, collation })
        }
        TypeCode::Varchar => {
            let length = if length == 0 {
                DEFAULT_VARCHAR_LENGTH
            } else {
                check_max(length, MAX_STRING_LENGTH as u64, "VARCHAR length")? as u32
            };
            Ok(SqlType::Varchar { length, collation })
        }
        TypeCode::Clob => Ok(SqlType::Clob {
            length: if length == 0 { DEFAULT_LOB_LENGTH } else { length },
            collation,
        }),
        other => Err(Error::InvalidValue(format!(
            "{:?} is not a character type",
            other
        ))),
    }
}

pub fn get_interval_type(
    start: IntervalField,
    end: IntervalField,
    leading: u32,
    fraction: u32,
) -> Result<SqlType> {
    if start.rank() > end.rank() {
        return Err(Error::InvalidValue(format!(
            "interval start field {} is finer than end field {}",
            start.name(),
            end.name()
        )));
    }
    if start.is_year_month() != end.is_year_month() {
        return Err(Error::InvalidValue(format!(
            "interval cannot span {} to {}",
            start.name(),
            end.name()
        )));
    }
    if leading > MAX_INTERVAL_LEADING {
        return Err(Error::InvalidValue(format!(
            "interval leading precision {} exceeds {}",
            leading, MAX_INTERVAL_LEADING
        )));
    }
    if fraction > MAX_INTERVAL_FRACTION {
        return Err(Error::InvalidValue(format!(
            "interval fraction {} exceeds {}",
            fraction, MAX_INTERVAL_FRACTION
        )));
    }
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
            fraction: if end == IntervalField::Second {
                fraction
            } else {
                0
            },
        }
    })
}

pub fn get_array_type(element: SqlType, cardinality: u32) -> Result<SqlType> {
    if matches!(element, SqlType::Array { .. }) {
        return Err(Error::InvalidValue(
            "arrays of arrays are not supported".to_string(),
        ));
    }
    let cardinality = if cardinality == 0 {
        DEFAULT_ARRAY_CARDINALITY
    } else {
        check_max(
            cardinality as u64,
            MAX_ARRAY_CARDINALITY as u64,
            "array cardinality",
        )? as u32
    };
    Ok(SqlType::Array {
        element: Box::new(element),
        cardinality,
    })
}

pub fn get_row_type(fields: Vec<SqlType>) -> Result<SqlType> {
    if fields.is_empty() {
        return Err(Error::InvalidValue(
            "ROW requires at least one field".to_string(),
        ));
    }
    Ok(SqlType::Row { fields })
}

fn datetime_scale(precision: u64, default: u32) -> Result<u32> {
    if precision == 0 {
        return Ok(default);
    }
    Ok(check_max(precision, MAX_DATETIME_SCALE as u64, "fractional seconds precision")? as u32)
}

fn interval_span(code: TypeCode) -> Result<(IntervalField, IntervalField)> {
    use IntervalField::*;
    Ok(match code {
        TypeCode::IntervalYear => (Year, Year),
        TypeCode::IntervalMonth => (Month, Month),
        TypeCode::IntervalYearToMonth => (Year, Month),
        TypeCode::IntervalDay => (Day, Day),
        TypeCode::IntervalHour => (Hour, Hour),
        TypeCode::IntervalMinute => (Minute, Minute),
        TypeCode::IntervalSecond => (Second, Second),
        TypeCode::IntervalDayToHour => (Day, Hour),
        TypeCode::IntervalDayToMinute => (Day, Minute),
        TypeCode::IntervalDayToSecond => (Day, Second),
        TypeCode::IntervalHourToMinute => (Hour, Minute),
        TypeCode::IntervalHourToSecond => (Hour, Second),
        TypeCode::IntervalMinuteToSecond => (Minute, Second),
        other => {
            return Err(Error::Internal(format!(
                "{:?} is not an interval code",
                other
            )));
        }
    })
}

fn check_max(value: u64, max: u64, what: &str) -> Result<u64> {
    if value > max {
        return Err(Error::InvalidValue(format!(
            "{} {} exceeds maximum {}",
            what, value, max
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_defaults_and_limits() {
        let t = get_type(TypeCode::Numeric, 0, 0).unwrap();
        assert_eq!(
            t,
            SqlType::Numeric {
                precision: DEFAULT_NUMERIC_PRECISION,
                scale: 0
            }
        );
        assert!(get_type(TypeCode::Numeric, 29, 0).is_err());
        assert!(get_type(TypeCode::Numeric, 5, 6).is_err());
    }

    #[test]
    fn test_char_defaults() {
        let t = get_type(TypeCode::Char, 0, 0).unwrap();
        assert_eq!(
            t,
            SqlType::Char {
                length: 1,
                collation: Collation::DEFAULT
            }
        );
        let t = get_type(TypeCode::Varchar, 100, 0).unwrap();
        assert_eq!(
            t,
            SqlType::Varchar {
                length: 100,
                collation: Collation::DEFAULT
            }
        );
    }

    #[test]
    fn test_interval_validation() {
        assert!(get_interval_type(IntervalField::Month, IntervalField::Year, 2, 0).is_err());
        assert!(get_interval_type(IntervalField::Year, IntervalField::Day, 2, 0).is_err());
        assert!(get_interval_type(IntervalField::Day, IntervalField::Second, 10, 0).is_err());

        let t = get_type(TypeCode::IntervalDayToSecond, 0, 0).unwrap();
        assert_eq!(
            t,
            SqlType::IntervalDayTime {
                start: IntervalField::Day,
                end: IntervalField::Second,
                leading: DEFAULT_INTERVAL_LEADING,
                fraction: DEFAULT_INTERVAL_FRACTION,
            }
        );
    }

    #[test]
    fn test_timestamp_scale() {
        let t = get_type(TypeCode::Timestamp, 0, 0).unwrap();
        assert_eq!(
            t,
            SqlType::Timestamp {
                scale: DEFAULT_TIMESTAMP_SCALE,
                with_zone: false
            }
        );
        assert!(get_type(TypeCode::Time, 10, 0).is_err());
    }

    #[test]
    fn test_array_rules() {
        let t = get_array_type(SqlType::Integer, 0).unwrap();
        assert_eq!(
            t,
            SqlType::Array {
                element: Box::new(SqlType::Integer),
                cardinality: DEFAULT_ARRAY_CARDINALITY
            }
        );
        let nested = get_array_type(t, 4);
        assert!(nested.is_err());
    }

    #[test]
    fn test_name_lookup() {
        assert_eq!(TypeCode::from_name("varchar"), Some(TypeCode::Varchar));
        assert_eq!(
            TypeCode::from_name("INTERVAL DAY TO SECOND"),
            Some(TypeCode::IntervalDayToSecond)
        );
        assert_eq!(TypeCode::from_name("GEOMETRY"), None);
    }
}
