//! Composite kernel
//!
//! ARRAY and ROW wrap other types. Every operation delegates element-wise to
//! the wrapped types; the only semantics owned here are cardinality checks,
//! lexicographic ordering, and NULL element placement (NULLs sort after
//! every non-null element).

use super::data_type::SqlType;
use super::value::Value;
use crate::error::{CastWarning, Error, Result};
use crate::session::SessionContext;
use std::cmp::Ordering;

pub fn compare_arrays(
    session: &dyn SessionContext,
    element: &SqlType,
    a: &Value,
    b: &Value,
) -> Result<Ordering> {
    let (x, y) = (require_array(a)?, require_array(b)?);
    for (ex, ey) in x.iter().zip(y.iter()) {
        let ord = compare_elements(session, element, ex, ey)?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(x.len().cmp(&y.len()))
}

pub fn compare_rows(
    session: &dyn SessionContext,
    fields: &[SqlType],
    a: &Value,
    b: &Value,
) -> Result<Ordering> {
    let (x, y) = (require_row(a)?, require_row(b)?);
    if x.len() != fields.len() || y.len() != fields.len() {
        return Err(Error::IncompatibleTypes {
            left: format!("ROW({})", fields.len()),
            right: format!("ROW({})", x.len().max(y.len())),
        });
    }
    for ((field, ex), ey) in fields.iter().zip(x.iter()).zip(y.iter()) {
        let ord = compare_elements(session, field, ex, ey)?;
        if ord != Ordering::Equal {
            return Ok(ord);
        }
    }
    Ok(Ordering::Equal)
}

fn compare_elements(
    session: &dyn SessionContext,
    ty: &SqlType,
    a: &Value,
    b: &Value,
) -> Result<Ordering> {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ok(Ordering::Equal),
        (true, false) => Ok(Ordering::Greater),
        (false, true) => Ok(Ordering::Less),
        (false, false) => ty.compare(session, a, b),
    }
}

pub fn get_aggregate_type(left: &SqlType, right: &SqlType) -> Result<SqlType> {
    match (left, right) {
        (
            SqlType::Array {
                element: e1,
                cardinality: c1,
            },
            SqlType::Array {
                element: e2,
                cardinality: c2,
            },
        ) => Ok(SqlType::Array {
            element: Box::new(e1.get_aggregate_type(e2)?),
            cardinality: (*c1).max(*c2),
        }),
        (SqlType::Row { fields: f1 }, SqlType::Row { fields: f2 }) => {
            if f1.len() != f2.len() {
                return Err(Error::IncompatibleTypes {
                    left: left.full_name(),
                    right: right.full_name(),
                });
            }
            let fields = f1
                .iter()
                .zip(f2.iter())
                .map(|(a, b)| a.get_aggregate_type(b))
                .collect::<Result<Vec<_>>>()?;
            Ok(SqlType::Row { fields })
        }
        _ => Err(Error::IncompatibleTypes {
            left: left.name().to_string(),
            right: right.name().to_string(),
        }),
    }
}

pub fn convert_to_type(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
    source: &SqlType,
) -> Result<Value> {
    element_wise(session, target, value, source, &mut |session, ty, v, src| {
        ty.convert_to_type(session, v, src)
    })
}

pub fn cast_to_type(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
    source: &SqlType,
    warnings: &mut Vec<CastWarning>,
) -> Result<Value> {
    element_wise(session, target, value, source, &mut |session, ty, v, src| {
        ty.cast_to_type(session, v, src, warnings)
    })
}

pub fn convert_to_type_limits(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
) -> Result<Value> {
    element_wise(session, target, value, target, &mut |session, ty, v, _| {
        ty.convert_to_type_limits(session, v)
    })
}

fn element_wise(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
    source: &SqlType,
    convert: &mut dyn FnMut(&dyn SessionContext, &SqlType, &Value, &SqlType) -> Result<Value>,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match target {
        SqlType::Array {
            element,
            cardinality,
        } => {
            let items = require_array(value)?;
            if items.len() > *cardinality as usize {
                return Err(Error::CardinalityViolation {
                    cardinality: items.len(),
                    max: *cardinality as usize,
                });
            }
            let source_element = match source {
                SqlType::Array { element, .. } => element,
                _ => element,
            };
            let converted = items
                .iter()
                .map(|item| convert(session, element, item, source_element))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Array(converted))
        }
        SqlType::Row { fields } => {
            let items = require_row(value)?;
            if items.len() != fields.len() {
                return Err(Error::IncompatibleTypes {
                    left: target.full_name(),
                    right: format!("ROW({})", items.len()),
                });
            }
            let source_fields: Vec<&SqlType> = match source {
                SqlType::Row { fields: sf } if sf.len() == fields.len() => sf.iter().collect(),
                _ => fields.iter().collect(),
            };
            let converted = fields
                .iter()
                .zip(source_fields)
                .zip(items.iter())
                .map(|((ty, src), item)| convert(session, ty, item, src))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Row(converted))
        }
        _ => Err(Error::Internal(format!(
            "composite kernel invoked for {}",
            target.name()
        ))),
    }
}

/// Array concatenation; the result type's cardinality bounds the total.
pub fn concat_arrays(target: &SqlType, a: &Value, b: &Value) -> Result<Value> {
    let max = match target {
        SqlType::Array { cardinality, .. } => *cardinality as usize,
        _ => {
            return Err(Error::Internal(format!(
                "array concat on {}",
                target.name()
            )));
        }
    };
    let (x, y) = (require_array(a)?, require_array(b)?);
    let total = x.len() + y.len();
    if total > max {
        return Err(Error::CardinalityViolation {
            cardinality: total,
            max,
        });
    }
    Ok(Value::Array(x.iter().chain(y.iter()).cloned().collect()))
}

pub fn cardinality(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Array(items) => Ok(Value::Integer(items.len() as i32)),
        other => Err(Error::IncompatibleTypes {
            left: "ARRAY".to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

/// 1-based element access; out-of-bounds is an error, not NULL.
pub fn element_at(value: &Value, index: i64) -> Result<Value> {
    let items = require_array(value)?;
    if index < 1 || index as usize > items.len() {
        return Err(Error::InvalidValue(format!(
            "array index {} out of bounds 1..{}",
            index,
            items.len()
        )));
    }
    Ok(items[index as usize - 1].clone())
}

/// TRIM_ARRAY: drop `count` elements from the end.
pub fn trim_array(value: &Value, count: i64) -> Result<Value> {
    let items = require_array(value)?;
    if count < 0 || count as usize > items.len() {
        return Err(Error::InvalidValue(format!(
            "cannot trim {} elements from array of {}",
            count,
            items.len()
        )));
    }
    Ok(Value::Array(
        items[..items.len() - count as usize].to_vec(),
    ))
}

pub fn convert_to_string(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
) -> Result<String> {
    match (target, value) {
        (SqlType::Array { element, .. }, Value::Array(items)) => {
            let rendered = items
                .iter()
                .map(|item| render_element(session, element, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("ARRAY[{}]", rendered.join(", ")))
        }
        (SqlType::Row { fields }, Value::Row(items)) => {
            let rendered = fields
                .iter()
                .zip(items.iter())
                .map(|(ty, item)| render_element(session, ty, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("ROW({})", rendered.join(", ")))
        }
        (_, other) => Err(Error::IncompatibleTypes {
            left: target.name().to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

fn render_element(
    session: &dyn SessionContext,
    ty: &SqlType,
    value: &Value,
) -> Result<String> {
    if value.is_null() {
        return Ok("NULL".to_string());
    }
    ty.convert_to_sql_string(session, value)
}

fn require_array(value: &Value) -> Result<&[Value]> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(Error::IncompatibleTypes {
            left: "ARRAY".to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

fn require_row(value: &Value) -> Result<&[Value]> {
    match value {
        Value::Row(items) => Ok(items),
        other => Err(Error::IncompatibleTypes {
            left: "ROW".to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}
