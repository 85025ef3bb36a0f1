//! Typed literal scanning
//!
//! Turns SQL literal text into a value of a known target type. This is the
//! inverse of `convert_to_sql_string`: quoted forms, keyword prefixes
//! (DATE, INTERVAL, X) and composite constructors are all accepted, as is
//! the bare body for each of them.

use super::data_type::SqlType;
use super::value::Value;
use super::{binary, boolean, character, datetime, interval, number};
use crate::error::{Error, Result};
use crate::session::SessionContext;
use silica_value::BitString;

pub fn scan_value(
    session: &dyn SessionContext,
    text: &str,
    target: &SqlType,
) -> Result<Value> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }
    let bad = || Error::InvalidFormat {
        expected: target.name().to_string(),
        found: text.to_string(),
    };

    match target {
        SqlType::Boolean => boolean::parse_boolean(text),
        _ if target.is_numeric() => {
            let parsed = number::parse_numeric(target, text)?;
            number::convert_to_type_limits(session, target, &parsed)
        }
        _ if target.is_character() => {
            let body = match unquote(text) {
                Some(inner) => inner,
                None => text.to_string(),
            };
            character::convert_to_type_limits(session, target, &Value::String(body))
        }
        _ if target.is_binary() => {
            let bits = parse_binary_literal(text).ok_or_else(bad)?;
            binary::convert_to_type_limits(session, target, &Value::Binary(bits))
        }
        _ if target.is_datetime() => {
            let body = strip_keyword(text, &["TIMESTAMP", "TIME", "DATE"]);
            let body = match unquote(body) {
                Some(inner) => inner,
                None => body.to_string(),
            };
            datetime::parse_literal(session, target, body.trim())
        }
        _ if target.is_interval() => {
            let body = strip_keyword(text, &["INTERVAL"]);
            // The qualifier after the quoted body restates the target span.
            let body = match body.find('\'') {
                Some(open) => {
                    let rest = &body[open + 1..];
                    let close = rest.find('\'').ok_or_else(bad)?;
                    rest[..close].to_string()
                }
                None => body.to_string(),
            };
            interval::parse_literal(target, body.trim())
        }
        SqlType::Array { element, .. } => {
            let inner = composite_body(text, "ARRAY[", "]").ok_or_else(bad)?;
            let items = split_top_level(inner)
                .into_iter()
                .map(|item| scan_value(session, item, element))
                .collect::<Result<Vec<_>>>()?;
            target.convert_to_type_limits(session, &Value::Array(items))
        }
        SqlType::Row { fields } => {
            let inner = composite_body(text, "ROW(", ")").ok_or_else(bad)?;
            let parts = split_top_level(inner);
            if parts.len() != fields.len() {
                return Err(bad());
            }
            let items = parts
                .into_iter()
                .zip(fields.iter())
                .map(|(part, ty)| scan_value(session, part, ty))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Row(items))
        }
        _ => Err(bad()),
    }
}

/// Strip a leading keyword (case-insensitive) and following whitespace.
fn strip_keyword<'a>(text: &'a str, keywords: &[&str]) -> &'a str {
    for keyword in keywords {
        if text.len() > keyword.len()
            && text[..keyword.len()].eq_ignore_ascii_case(keyword)
            && text.as_bytes()[keyword.len()].is_ascii_whitespace()
        {
            return text[keyword.len()..].trim_start();
        }
    }
    text
}

/// Undo single-quote wrapping with `''` escapes; `None` if not quoted.
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

fn parse_binary_literal(text: &str) -> Option<BitString> {
    let upper_prefix = text.get(..2).map(|p| p.to_ascii_uppercase());
    match upper_prefix.as_deref() {
        Some("X'") => {
            let body = text[2..].strip_suffix('\'')?;
            let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
            hex::decode(&compact).ok().map(BitString::from_bytes)
        }
        Some("B'") => {
            let body = text[2..].strip_suffix('\'')?;
            let mut bits = BitString::empty();
            for (i, c) in body.chars().enumerate() {
                match c {
                    '0' => bits = bits.zero_extend(i + 1),
                    '1' => {
                        bits = bits.zero_extend(i + 1);
                        bits.set_bit(i, true);
                    }
                    _ => return None,
                }
            }
            Some(bits)
        }
        _ => hex::decode(text).ok().map(BitString::from_bytes),
    }
}

fn composite_body<'a>(text: &'a str, open: &str, close: &str) -> Option<&'a str> {
    if text.len() >= open.len() + close.len()
        && text[..open.len()].eq_ignore_ascii_case(open)
        && text.ends_with(close)
    {
        Some(&text[open.len()..text.len() - close.len()])
    } else {
        None
    }
}

/// Split on commas outside quotes, brackets, and parentheses.
fn split_top_level(text: &str) -> Vec<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_quote = false;
    let mut start = 0;
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_quote = !in_quote,
            b'[' | b'(' if !in_quote => depth += 1,
            b']' | b')' if !in_quote => depth -= 1,
            b',' if !in_quote && depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(text[start..].trim());
    parts
}
