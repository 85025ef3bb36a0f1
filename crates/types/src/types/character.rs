//! Character kernel
//!
//! CHAR, VARCHAR and CLOB. Lengths are counted in characters, not bytes.
//! CHAR values are space-padded to their declared length; comparison under a
//! pad-space collation makes the padding invisible. Truncation that would
//! drop non-space characters is an error on implicit conversion and a
//! warning (with truncation) on explicit CAST.

use super::collation::Collation;
use super::data_type::SqlType;
use super::registry::MAX_STRING_LENGTH;
use super::value::Value;
use crate::error::{CastWarning, Error, Result};
use crate::session::SessionContext;
use silica_value::LobLocator;
use std::cmp::Ordering;

enum LengthPolicy {
    /// Non-space overflow fails.
    Strict,
    /// Non-space overflow truncates and records a warning.
    Truncate,
}

/// Materialize any character representation as an owned string. CLOB
/// locators are resolved through the session's lob store.
pub(crate) fn as_text(session: &dyn SessionContext, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Clob(locator) => {
            let store = session.lobs();
            let length = store.clob_length(locator.id)?;
            store.read_chars(locator.id, 0, length as usize)
        }
        other => Err(Error::IncompatibleTypes {
            left: "CHARACTER".to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

pub fn compare(
    session: &dyn SessionContext,
    collation: &Collation,
    a: &Value,
    b: &Value,
) -> Result<Ordering> {
    let (x, y) = (as_text(session, a)?, as_text(session, b)?);
    Ok(collation.compare(&x, &y))
}

/// Widest of two character types: CHAR < VARCHAR < CLOB, length is the max.
pub fn get_aggregate_type(left: &SqlType, right: &SqlType) -> Result<SqlType> {
    if left == right {
        return Ok(left.clone());
    }
    // A character type aggregated with a non-character one keeps the
    // character side, widened to hold the other's display form.
    if !right.is_character() {
        let needed = right.display_size() as u64;
        return Ok(widen(left, needed, collation_of(left))?);
    }
    if !left.is_character() {
        return get_aggregate_type(right, left);
    }

    let collation = resolve_collations(collation_of(left), collation_of(right))?;
    let length = char_length(left).max(char_length(right));
    let ty = match (rank(left), rank(right)) {
        (2, _) | (_, 2) => SqlType::Clob { length, collation },
        (1, _) | (_, 1) => SqlType::Varchar {
            length: length.min(MAX_STRING_LENGTH as u64) as u32,
            collation,
        },
        _ => SqlType::Char {
            length: length as u32,
            collation,
        },
    };
    Ok(ty)
}

/// Concatenation result: lengths add, the wider storage class wins.
pub fn get_combined_type(left: &SqlType, right: &SqlType) -> Result<SqlType> {
    let collation = resolve_collations(collation_of(left), collation_of(right))?;
    let length = char_length(left).saturating_add(char_length(right));
    if rank(left) == 2 || rank(right) == 2 {
        return Ok(SqlType::Clob { length, collation });
    }
    Ok(SqlType::Varchar {
        length: length.min(MAX_STRING_LENGTH as u64) as u32,
        collation,
    })
}

pub fn convert_to_type(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
    source: &SqlType,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if !source.is_character() {
        return Err(Error::IncompatibleTypes {
            left: target.name().to_string(),
            right: source.name().to_string(),
        });
    }
    let text = as_text(session, value)?;
    store(session, target, text, LengthPolicy::Strict, &mut Vec::new())
}

pub fn cast_to_type(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
    source: &SqlType,
    warnings: &mut Vec<CastWarning>,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    // CAST renders any source type through its string form.
    let text = if source.is_character() {
        as_text(session, value)?
    } else {
        source.convert_to_string(session, value)?
    };
    store(session, target, text, LengthPolicy::Truncate, warnings)
}

pub fn convert_to_type_limits(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let text = as_text(session, value)?;
    store(session, target, text, LengthPolicy::Strict, &mut Vec::new())
}

fn store(
    session: &dyn SessionContext,
    target: &SqlType,
    text: String,
    policy: LengthPolicy,
    warnings: &mut Vec<CastWarning>,
) -> Result<Value> {
    let text = fit(target, target_length(target), text, policy, warnings)?;
    match target {
        SqlType::Char { length, .. } => {
            let n = text.chars().count();
            let mut padded = text;
            padded.extend(std::iter::repeat_n(' ', (*length as usize).saturating_sub(n)));
            Ok(Value::String(padded))
        }
        SqlType::Varchar { .. } => Ok(Value::String(text)),
        SqlType::Clob { .. } => {
            let store = session.lobs();
            let id = store.create_clob(text.chars().count() as u64)?;
            store.write_chars(id, 0, &text)?;
            Ok(Value::Clob(LobLocator { id }))
        }
        _ => Err(Error::Internal(format!(
            "character kernel invoked for {}",
            target.name()
        ))),
    }
}

/// Enforce the declared length. Trailing spaces beyond the limit drop
/// silently; dropping anything else depends on the policy.
fn fit(
    target: &SqlType,
    limit: u64,
    text: String,
    policy: LengthPolicy,
    warnings: &mut Vec<CastWarning>,
) -> Result<String> {
    let count = text.chars().count() as u64;
    if count <= limit {
        return Ok(text);
    }
    let kept: String = text.chars().take(limit as usize).collect();
    let excess_all_spaces = text.chars().skip(limit as usize).all(|c| c == ' ');
    if excess_all_spaces {
        return Ok(kept);
    }
    match policy {
        LengthPolicy::Strict => Err(Error::StringDataRightTruncation {
            type_name: target.full_name(),
        }),
        LengthPolicy::Truncate => {
            warnings.push(CastWarning::truncation(target.full_name()));
            Ok(kept)
        }
    }
}

pub fn convert_to_string(session: &dyn SessionContext, value: &Value) -> Result<String> {
    as_text(session, value)
}

/// SQL literal form, with embedded quotes doubled.
pub fn convert_to_sql_string(session: &dyn SessionContext, value: &Value) -> Result<String> {
    let text = as_text(session, value)?;
    Ok(format!("'{}'", text.replace('\'', "''")))
}

pub fn position(
    session: &dyn SessionContext,
    haystack: &Value,
    needle: &Value,
) -> Result<Option<u64>> {
    let (h, n) = (as_text(session, haystack)?, as_text(session, needle)?);
    if n.is_empty() {
        return Ok(Some(1));
    }
    Ok(h.find(&n)
        .map(|byte| h[..byte].chars().count() as u64 + 1))
}

/// 1-based SUBSTRING with SQL's negative-start clamping.
pub fn substring(
    session: &dyn SessionContext,
    value: &Value,
    start: i64,
    length: Option<i64>,
) -> Result<Value> {
    let text = as_text(session, value)?;
    let total = text.chars().count() as i64;
    let begin = (start - 1).max(0);
    let end = match length {
        Some(n) if n < 0 => {
            return Err(Error::InvalidValue(
                "negative substring length".to_string(),
            ));
        }
        Some(n) => (start - 1 + n).clamp(0, total),
        None => total,
    };
    let taken: String = text
        .chars()
        .skip(begin as usize)
        .take((end - begin).max(0) as usize)
        .collect();
    Ok(Value::String(taken))
}

pub fn overlay(
    session: &dyn SessionContext,
    value: &Value,
    replacement: &Value,
    start: i64,
    length: Option<i64>,
) -> Result<Value> {
    let text = as_text(session, value)?;
    let repl = as_text(session, replacement)?;
    let replaced = length.unwrap_or(repl.chars().count() as i64);
    if start < 1 || replaced < 0 {
        return Err(Error::InvalidValue("overlay out of range".to_string()));
    }
    let begin = (start - 1) as usize;
    let head: String = text.chars().take(begin).collect();
    let tail: String = text.chars().skip(begin + replaced as usize).collect();
    Ok(Value::String(format!("{head}{repl}{tail}")))
}

pub fn trim(
    session: &dyn SessionContext,
    value: &Value,
    leading: bool,
    trailing: bool,
    pad: char,
) -> Result<Value> {
    let text = as_text(session, value)?;
    let trimmed = match (leading, trailing) {
        (true, true) => text.trim_matches(pad).to_string(),
        (true, false) => text.trim_start_matches(pad).to_string(),
        (false, true) => text.trim_end_matches(pad).to_string(),
        (false, false) => text,
    };
    Ok(Value::String(trimmed))
}

fn rank(ty: &SqlType) -> u8 {
    match ty {
        SqlType::Char { .. } => 0,
        SqlType::Varchar { .. } => 1,
        SqlType::Clob { .. } => 2,
        _ => 0,
    }
}

fn char_length(ty: &SqlType) -> u64 {
    match ty {
        SqlType::Char { length, .. } | SqlType::Varchar { length, .. } => *length as u64,
        SqlType::Clob { length, .. } => *length,
        other => other.display_size() as u64,
    }
}

fn target_length(ty: &SqlType) -> u64 {
    char_length(ty)
}

fn collation_of(ty: &SqlType) -> Collation {
    match ty {
        SqlType::Char { collation, .. }
        | SqlType::Varchar { collation, .. }
        | SqlType::Clob { collation, .. } => *collation,
        _ => Collation::DEFAULT,
    }
}

fn widen(ty: &SqlType, needed: u64, collation: Collation) -> Result<SqlType> {
    let length = char_length(ty).max(needed);
    Ok(match ty {
        SqlType::Clob { .. } => SqlType::Clob { length, collation },
        _ => SqlType::Varchar {
            length: length.min(MAX_STRING_LENGTH as u64) as u32,
            collation,
        },
    })
}

/// Collations merge when equal; a default collation yields to an explicit
/// one; two distinct explicit collations cannot be compared.
fn resolve_collations(left: Collation, right: Collation) -> Result<Collation> {
    if left == right {
        return Ok(left);
    }
    if left.is_default() {
        return Ok(right);
    }
    if right.is_default() {
        return Ok(left);
    }
    Err(Error::IncompatibleTypes {
        left: format!("{:?}", left.kind),
        right: format!("{:?}", right.kind),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LocalSession;

    fn varchar(n: u32) -> SqlType {
        SqlType::Varchar {
            length: n,
            collation: Collation::DEFAULT,
        }
    }

    fn char_t(n: u32) -> SqlType {
        SqlType::Char {
            length: n,
            collation: Collation::DEFAULT,
        }
    }

    #[test]
    fn test_char_pads_to_length() {
        let session = LocalSession::new();
        let v = convert_to_type(
            &session,
            &char_t(5),
            &Value::String("ab".into()),
            &SqlType::VARCHAR,
        )
        .unwrap();
        assert_eq!(v, Value::String("ab   ".into()));
    }

    #[test]
    fn test_trailing_space_truncation_is_silent() {
        let session = LocalSession::new();
        let v = convert_to_type(
            &session,
            &varchar(2),
            &Value::String("ab   ".into()),
            &SqlType::VARCHAR,
        )
        .unwrap();
        assert_eq!(v, Value::String("ab".into()));
    }

    #[test]
    fn test_implicit_truncation_fails_cast_warns() {
        let session = LocalSession::new();
        let long = Value::String("hello".into());
        let err = convert_to_type(&session, &varchar(3), &long, &SqlType::VARCHAR).unwrap_err();
        assert!(matches!(err, Error::StringDataRightTruncation { .. }));

        let mut warnings = Vec::new();
        let v = cast_to_type(&session, &varchar(3), &long, &SqlType::VARCHAR, &mut warnings)
            .unwrap();
        assert_eq!(v, Value::String("hel".into()));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_aggregate_ranks_storage_classes() {
        let t = get_aggregate_type(&char_t(5), &varchar(3)).unwrap();
        assert_eq!(t, varchar(5));
        let t = get_aggregate_type(
            &varchar(3),
            &SqlType::Clob {
                length: 100,
                collation: Collation::DEFAULT,
            },
        )
        .unwrap();
        assert!(matches!(t, SqlType::Clob { length: 100, .. }));
    }

    #[test]
    fn test_concat_adds_lengths() {
        let t = get_combined_type(&varchar(3), &varchar(4)).unwrap();
        assert_eq!(t, varchar(7));
    }

    #[test]
    fn test_collation_resolution() {
        let upper = SqlType::Varchar {
            length: 4,
            collation: Collation::upper_case(),
        };
        let t = get_aggregate_type(&varchar(2), &upper).unwrap();
        assert!(matches!(
            t,
            SqlType::Varchar { length: 4, collation } if collation == Collation::upper_case()
        ));

        let locale = SqlType::Varchar {
            length: 4,
            collation: Collation::locale(),
        };
        assert!(get_aggregate_type(&upper, &locale).is_err());
    }

    #[test]
    fn test_substring_clamps() {
        let session = LocalSession::new();
        let v = Value::String("hello".into());
        assert_eq!(
            substring(&session, &v, 2, Some(3)).unwrap(),
            Value::String("ell".into())
        );
        assert_eq!(
            substring(&session, &v, -2, Some(4)).unwrap(),
            Value::String("h".into())
        );
        assert!(substring(&session, &v, 1, Some(-1)).is_err());
    }

    #[test]
    fn test_position_is_one_based() {
        let session = LocalSession::new();
        let h = Value::String("banana".into());
        assert_eq!(
            position(&session, &h, &Value::String("nan".into())).unwrap(),
            Some(3)
        );
        assert_eq!(
            position(&session, &h, &Value::String("x".into())).unwrap(),
            None
        );
        assert_eq!(
            position(&session, &h, &Value::String(String::new())).unwrap(),
            Some(1)
        );
    }

    #[test]
    fn test_overlay() {
        let session = LocalSession::new();
        let v = overlay(
            &session,
            &Value::String("Txxxxas".into()),
            &Value::String("hom".into()),
            2,
            Some(4),
        )
        .unwrap();
        assert_eq!(v, Value::String("Thomas".into()));
    }

    #[test]
    fn test_clob_round_trip() {
        let session = LocalSession::new();
        let target = SqlType::Clob {
            length: 1 << 20,
            collation: Collation::DEFAULT,
        };
        let v = convert_to_type(
            &session,
            &target,
            &Value::String("stored".into()),
            &SqlType::VARCHAR,
        )
        .unwrap();
        assert_eq!(as_text(&session, &v).unwrap(), "stored");
    }

    #[test]
    fn test_sql_literal_doubles_quotes() {
        let session = LocalSession::new();
        let s = convert_to_sql_string(&session, &Value::String("it's".into())).unwrap();
        assert_eq!(s, "'it''s'");
    }
}
