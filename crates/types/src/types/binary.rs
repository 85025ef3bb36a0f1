//! Binary kernel
//!
//! BINARY, VARBINARY, BLOB and the bit-string types share one comparison
//! group and one runtime shape. Comparison zero-extends the shorter operand,
//! mirroring the space padding of fixed-width character types. Conversions
//! to and from text go through hex and are cast-only.

use super::data_type::SqlType;
use super::registry::{MAX_BINARY_LENGTH, MAX_BIT_LENGTH};
use super::value::Value;
use crate::error::{CastWarning, Error, Result};
use crate::session::SessionContext;
use silica_value::{BitString, LobLocator};
use std::cmp::Ordering;

const COMPARE_BLOCK: usize = 8 * 1024;

enum LengthPolicy {
    Strict,
    Truncate,
}

pub(crate) fn as_bits(session: &dyn SessionContext, value: &Value) -> Result<BitString> {
    match value {
        Value::Binary(b) => Ok(b.clone()),
        Value::Blob(locator) => {
            let store = session.lobs();
            let length = store.blob_length(locator.id)?;
            let bytes = store.read_bytes(locator.id, 0, length as usize)?;
            Ok(BitString::from_bytes(bytes))
        }
        other => Err(Error::IncompatibleTypes {
            left: "BINARY".to_string(),
            right: other.kind_name().to_string(),
        }),
    }
}

pub fn compare(session: &dyn SessionContext, a: &Value, b: &Value) -> Result<Ordering> {
    if let (Value::Blob(x), Value::Blob(y)) = (a, b) {
        return compare_blobs(session, x, y);
    }
    let (x, y) = (as_bits(session, a)?, as_bits(session, b)?);
    let len = x.bit_length().max(y.bit_length());
    Ok(x.zero_extend(len).as_bytes().cmp(y.zero_extend(len).as_bytes()))
}

/// Block-wise comparison so neither blob is materialized whole. Trailing
/// zero bytes on the longer operand compare equal, like padding.
fn compare_blobs(
    session: &dyn SessionContext,
    a: &LobLocator,
    b: &LobLocator,
) -> Result<Ordering> {
    let store = session.lobs();
    let (la, lb) = (store.blob_length(a.id)?, store.blob_length(b.id)?);
    let longest = la.max(lb);
    let mut offset = 0u64;
    while offset < longest {
        let want = COMPARE_BLOCK.min((longest - offset) as usize);
        let mut xa = store.read_bytes(a.id, offset.min(la), want.min((la - offset.min(la)) as usize))?;
        let mut xb = store.read_bytes(b.id, offset.min(lb), want.min((lb - offset.min(lb)) as usize))?;
        xa.resize(want, 0);
        xb.resize(want, 0);
        match xa.cmp(&xb) {
            Ordering::Equal => offset += want as u64,
            other => return Ok(other),
        }
    }
    Ok(Ordering::Equal)
}

/// Widest of two binary types. Byte storage outranks bit storage; BLOB
/// outranks both.
pub fn get_aggregate_type(left: &SqlType, right: &SqlType) -> Result<SqlType> {
    if left == right {
        return Ok(left.clone());
    }
    let bits = bit_capacity(left).max(bit_capacity(right));
    Ok(match rank(left).max(rank(right)) {
        4 => SqlType::Blob {
            length: bits.div_ceil(8),
        },
        3 | 2 => SqlType::Varbinary {
            length: (bits.div_ceil(8)).min(MAX_BINARY_LENGTH as u64) as u32,
        },
        1 => SqlType::BitVarying {
            length: bits.min(MAX_BIT_LENGTH as u64) as u32,
        },
        _ => SqlType::Bit {
            length: bits.min(MAX_BIT_LENGTH as u64) as u32,
        },
    })
}

/// Concatenation result: capacities add.
pub fn get_combined_type(left: &SqlType, right: &SqlType) -> Result<SqlType> {
    let bits = bit_capacity(left).saturating_add(bit_capacity(right));
    Ok(match rank(left).max(rank(right)) {
        4 => SqlType::Blob {
            length: bits.div_ceil(8),
        },
        3 | 2 => SqlType::Varbinary {
            length: (bits.div_ceil(8)).min(MAX_BINARY_LENGTH as u64) as u32,
        },
        _ => SqlType::BitVarying {
            length: bits.min(MAX_BIT_LENGTH as u64) as u32,
        },
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
    if !source.is_binary() {
        return Err(Error::IncompatibleTypes {
            left: target.name().to_string(),
            right: source.name().to_string(),
        });
    }
    let bits = as_bits(session, value)?;
    store(session, target, bits, LengthPolicy::Strict, &mut Vec::new())
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
    let bits = if source.is_binary() {
        as_bits(session, value)?
    } else if let (SqlType::Bit { .. } | SqlType::BitVarying { .. }, Value::Boolean(b)) =
        (target, value)
    {
        // BOOLEAN round-trips through the single bit B'1' / B'0'.
        BitString::from_bits(vec![if *b { 0b1000_0000 } else { 0 }], 1)
    } else if source.is_character() {
        // Hex literal text, whitespace-insensitive.
        let text = super::character::as_text(session, value)?;
        parse_hex(target, &text)?
    } else {
        return Err(Error::IncompatibleTypes {
            left: target.name().to_string(),
            right: source.name().to_string(),
        });
    };
    store(session, target, bits, LengthPolicy::Truncate, warnings)
}

pub fn convert_to_type_limits(
    session: &dyn SessionContext,
    target: &SqlType,
    value: &Value,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let bits = as_bits(session, value)?;
    store(session, target, bits, LengthPolicy::Strict, &mut Vec::new())
}

fn store(
    session: &dyn SessionContext,
    target: &SqlType,
    bits: BitString,
    policy: LengthPolicy,
    warnings: &mut Vec<CastWarning>,
) -> Result<Value> {
    if let SqlType::Blob { length } = target {
        let bits = fit(target, bits, length.saturating_mul(8), policy, warnings)?;
        let store = session.lobs();
        let id = store.create_blob(bits.byte_length() as u64)?;
        store.write_bytes(id, 0, bits.as_bytes())?;
        return Ok(Value::Blob(LobLocator { id }));
    }

    let limit = bit_capacity(target);
    let bits = fit(target, bits, limit, policy, warnings)?;
    let bits = match target {
        // Fixed-width targets zero-extend to their declared size.
        SqlType::Binary { .. } | SqlType::Bit { .. } => bits.zero_extend(limit as usize),
        _ => bits,
    };
    Ok(Value::Binary(bits))
}

/// Enforce the declared capacity in bits. Dropping only zero bits is
/// silent, like trailing-space character truncation.
fn fit(
    target: &SqlType,
    bits: BitString,
    limit: u64,
    policy: LengthPolicy,
    warnings: &mut Vec<CastWarning>,
) -> Result<BitString> {
    if bits.bit_length() as u64 <= limit {
        return Ok(bits);
    }
    if bits.all_zero_from(limit as usize) {
        return Ok(bits.take_bits(limit as usize));
    }
    match policy {
        LengthPolicy::Strict => Err(Error::DataTruncation {
            type_name: target.full_name(),
        }),
        LengthPolicy::Truncate => {
            warnings.push(CastWarning::truncation(target.full_name()));
            Ok(bits.take_bits(limit as usize))
        }
    }
}

fn parse_hex(target: &SqlType, text: &str) -> Result<BitString> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = hex::decode(&compact).map_err(|_| Error::InvalidFormat {
        expected: target.name().to_string(),
        found: text.to_string(),
    })?;
    Ok(BitString::from_bytes(bytes))
}

/// Hex rendering; bit strings that are not byte-aligned refuse.
pub fn convert_to_string(session: &dyn SessionContext, value: &Value) -> Result<String> {
    let bits = as_bits(session, value)?;
    if !bits.is_byte_aligned() {
        return Err(Error::InvalidValue(
            "bit string length is not a multiple of 8".to_string(),
        ));
    }
    Ok(hex::encode(bits.as_bytes()))
}

pub fn convert_to_sql_string(session: &dyn SessionContext, value: &Value) -> Result<String> {
    let bits = as_bits(session, value)?;
    Ok(bits.to_string())
}

pub fn concat(session: &dyn SessionContext, a: &Value, b: &Value) -> Result<Value> {
    let (x, y) = (as_bits(session, a)?, as_bits(session, b)?);
    Ok(Value::Binary(x.concat(&y)))
}

/// 1-based octet position of `needle` in `haystack`.
pub fn position(
    session: &dyn SessionContext,
    haystack: &Value,
    needle: &Value,
) -> Result<Option<u64>> {
    let (h, n) = (as_bits(session, haystack)?, as_bits(session, needle)?);
    let (h, n) = (h.as_bytes(), n.as_bytes());
    if n.is_empty() {
        return Ok(Some(1));
    }
    if n.len() > h.len() {
        return Ok(None);
    }
    Ok(h.windows(n.len())
        .position(|w| w == n)
        .map(|i| i as u64 + 1))
}

pub fn substring(
    session: &dyn SessionContext,
    value: &Value,
    start: i64,
    length: Option<i64>,
) -> Result<Value> {
    let bits = as_bits(session, value)?;
    let total = bits.byte_length() as i64;
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
    let begin = begin.min(total);
    Ok(Value::Binary(bits.sub_bits(
        begin as usize * 8,
        (end - begin).max(0) as usize * 8,
    )))
}

pub fn overlay(
    session: &dyn SessionContext,
    value: &Value,
    replacement: &Value,
    start: i64,
) -> Result<Value> {
    if start < 1 {
        return Err(Error::InvalidValue("overlay out of range".to_string()));
    }
    let bits = as_bits(session, value)?;
    let repl = as_bits(session, replacement)?;
    Ok(Value::Binary(bits.overlay(&repl, (start as usize - 1) * 8)))
}

fn rank(ty: &SqlType) -> u8 {
    match ty {
        SqlType::Bit { .. } => 0,
        SqlType::BitVarying { .. } => 1,
        SqlType::Binary { .. } => 2,
        SqlType::Varbinary { .. } => 3,
        SqlType::Blob { .. } => 4,
        _ => 0,
    }
}

fn bit_capacity(ty: &SqlType) -> u64 {
    match ty {
        SqlType::Bit { length } | SqlType::BitVarying { length } => *length as u64,
        SqlType::Binary { length } | SqlType::Varbinary { length } => *length as u64 * 8,
        SqlType::Blob { length } => length.saturating_mul(8),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LocalSession;

    fn binary(n: u32) -> SqlType {
        SqlType::Binary { length: n }
    }

    fn varbinary(n: u32) -> SqlType {
        SqlType::Varbinary { length: n }
    }

    #[test]
    fn test_zero_extended_compare() {
        let session = LocalSession::new();
        let a = Value::Binary(BitString::from_bytes(vec![0xAB]));
        let b = Value::Binary(BitString::from_bytes(vec![0xAB, 0x00, 0x00]));
        assert_eq!(compare(&session, &a, &b).unwrap(), Ordering::Equal);

        let c = Value::Binary(BitString::from_bytes(vec![0xAB, 0x01]));
        assert_eq!(compare(&session, &a, &c).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_five_bit_string_not_equal_to_byte() {
        let session = LocalSession::new();
        // B'10101' and X'A8' have identical backing bytes but different
        // lengths; zero-extension makes them compare equal only if the
        // trailing bits are zero, which they are here.
        let bit5 = Value::Binary(BitString::from_bits(vec![0xA8], 5));
        let byte = Value::Binary(BitString::from_bytes(vec![0xA8]));
        assert_eq!(compare(&session, &bit5, &byte).unwrap(), Ordering::Equal);

        let byte_set = Value::Binary(BitString::from_bytes(vec![0xA9]));
        assert_eq!(compare(&session, &bit5, &byte_set).unwrap(), Ordering::Less);
    }

    #[test]
    fn test_fixed_binary_pads() {
        let session = LocalSession::new();
        let v = convert_to_type(
            &session,
            &binary(3),
            &Value::Binary(BitString::from_bytes(vec![0x01])),
            &SqlType::VARBINARY,
        )
        .unwrap();
        assert_eq!(v, Value::Binary(BitString::from_bytes(vec![0x01, 0, 0])));
    }

    #[test]
    fn test_truncation_rules() {
        let session = LocalSession::new();
        let zeros = Value::Binary(BitString::from_bytes(vec![0x01, 0, 0]));
        let v = convert_to_type(&session, &varbinary(1), &zeros, &SqlType::VARBINARY).unwrap();
        assert_eq!(v, Value::Binary(BitString::from_bytes(vec![0x01])));

        let nonzero = Value::Binary(BitString::from_bytes(vec![0x01, 0x02]));
        let err =
            convert_to_type(&session, &varbinary(1), &nonzero, &SqlType::VARBINARY).unwrap_err();
        assert!(matches!(err, Error::DataTruncation { .. }));

        let mut warnings = Vec::new();
        let v = cast_to_type(&session, &varbinary(1), &nonzero, &SqlType::VARBINARY, &mut warnings)
            .unwrap();
        assert_eq!(v, Value::Binary(BitString::from_bytes(vec![0x01])));
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_hex_cast_round_trip() {
        let session = LocalSession::new();
        let mut warnings = Vec::new();
        let v = cast_to_type(
            &session,
            &varbinary(4),
            &Value::String("DEAD BEEF".into()),
            &SqlType::VARCHAR,
            &mut warnings,
        )
        .unwrap();
        assert_eq!(
            v,
            Value::Binary(BitString::from_bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]))
        );
        assert_eq!(convert_to_string(&session, &v).unwrap(), "deadbeef");
    }

    #[test]
    fn test_implicit_from_text_rejected() {
        let session = LocalSession::new();
        let err = convert_to_type(
            &session,
            &varbinary(4),
            &Value::String("00".into()),
            &SqlType::VARCHAR,
        )
        .unwrap_err();
        assert!(matches!(err, Error::IncompatibleTypes { .. }));
    }

    #[test]
    fn test_aggregate_and_concat_types() {
        let t = get_aggregate_type(&binary(2), &varbinary(5)).unwrap();
        assert_eq!(t, varbinary(5));
        let t = get_combined_type(&varbinary(2), &varbinary(5)).unwrap();
        assert_eq!(t, varbinary(7));
        let t = get_aggregate_type(&SqlType::Bit { length: 4 }, &SqlType::Bit { length: 9 })
            .unwrap();
        assert_eq!(t, SqlType::Bit { length: 9 });
    }

    #[test]
    fn test_boolean_casts_to_single_bit() {
        let session = LocalSession::new();
        let mut warnings = Vec::new();
        let bit1 = SqlType::Bit { length: 1 };
        let v = cast_to_type(&session, &bit1, &Value::Boolean(true), &SqlType::Boolean, &mut warnings)
            .unwrap();
        assert_eq!(v, Value::Binary(BitString::from_bits(vec![0b1000_0000], 1)));
        let v = cast_to_type(&session, &bit1, &Value::Boolean(false), &SqlType::Boolean, &mut warnings)
            .unwrap();
        assert_eq!(v, Value::Binary(BitString::from_bits(vec![0], 1)));

        // Byte-storage targets stay incompatible with BOOLEAN.
        let err = cast_to_type(
            &session,
            &varbinary(4),
            &Value::Boolean(true),
            &SqlType::Boolean,
            &mut warnings,
        )
        .unwrap_err();
        assert!(matches!(err, Error::IncompatibleTypes { .. }));
    }

    #[test]
    fn test_widest_blob_declaration_accepts_data() {
        let session = LocalSession::new();
        let target = SqlType::Blob { length: u64::MAX };
        let payload = Value::Binary(BitString::from_bytes(vec![7, 8]));
        let v = convert_to_type(&session, &target, &payload, &SqlType::VARBINARY).unwrap();
        assert!(matches!(v, Value::Blob(_)));
    }

    #[test]
    fn test_blob_round_trip_and_compare() {
        let session = LocalSession::new();
        let target = SqlType::Blob { length: 1 << 20 };
        let payload = Value::Binary(BitString::from_bytes(vec![1, 2, 3]));
        let a = convert_to_type(&session, &target, &payload, &SqlType::VARBINARY).unwrap();
        let b = convert_to_type(&session, &target, &payload, &SqlType::VARBINARY).unwrap();
        assert_eq!(compare(&session, &a, &b).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_position_and_substring() {
        let session = LocalSession::new();
        let h = Value::Binary(BitString::from_bytes(vec![1, 2, 3, 4]));
        let n = Value::Binary(BitString::from_bytes(vec![3, 4]));
        assert_eq!(position(&session, &h, &n).unwrap(), Some(3));
        let sub = substring(&session, &h, 2, Some(2)).unwrap();
        assert_eq!(sub, Value::Binary(BitString::from_bytes(vec![2, 3])));
    }
}
