//! # canon
//!
//! RFC-8785-style canonical JSON and a strict parser built on top of it.
//!
//! Every anchor and message in KKTP is signed, hashed, or compared as
//! canonical JSON: object keys sorted by their UTF-16 code unit sequence,
//! the minimal JSON escape set, no redundant whitespace, and numbers
//! serialized without scientific notation or a redundant `-0`. The strict
//! parser round-trips a byte string through [`parse_strict`] and rejects it
//! if re-serializing the parsed value does not reproduce the original bytes
//! exactly — any stray whitespace, out-of-order keys, or non-canonical
//! number form is a protocol violation, not a cosmetic difference.
//!
//! Only the integer number forms that appear on the wire in this protocol
//! (`version`, `seq`) are supported; a float, `NaN`, or `Infinity` anywhere
//! in the document is rejected rather than silently re-encoded, since no
//! anchor or message field is ever meant to carry one.

use serde_json::{Map, Number, Value};
use std::fmt;

/// Errors produced while canonicalizing or strictly parsing JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonError {
    /// The document failed to parse as JSON at all.
    InvalidJson(String),
    /// A number was non-finite (NaN/Infinity) or not a whole integer.
    NonFiniteOrFractionalNumber,
    /// Re-serializing the parsed value did not reproduce the input bytes,
    /// meaning the input was not already in canonical form.
    NotCanonical,
    /// The input was not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for CanonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(msg) => write!(f, "invalid JSON: {msg}"),
            Self::NonFiniteOrFractionalNumber => {
                write!(f, "canonical form only supports finite integer numbers")
            }
            Self::NotCanonical => write!(f, "input is not in canonical form"),
            Self::InvalidUtf8 => write!(f, "input is not valid UTF-8"),
        }
    }
}

impl std::error::Error for CanonError {}

/// Serializes `value` into its canonical JSON text form.
///
/// Object keys are sorted by UTF-16 code unit sequence (equivalent to byte
/// order for the ASCII-only keys this protocol uses). Arrays keep input
/// order. Strings use the minimal JSON escape set: `"`, `\`, the named
/// `\b\f\n\r\t` escapes, and `\u00XX` for every other control byte.
pub fn canonicalize(value: &Value) -> Result<String, CanonError> {
    let mut out = String::new();
    write_value(value, &mut out)?;
    Ok(out)
}

fn write_value(value: &Value, out: &mut String) -> Result<(), CanonError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(n, out)?,
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => write_object(map, out)?,
    }
    Ok(())
}

fn write_number(n: &Number, out: &mut String) -> Result<(), CanonError> {
    if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
        return Ok(());
    }
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
        return Ok(());
    }
    // Any value that only fits as f64 is either non-finite, fractional, or
    // out of i64/u64 range; all three are rejected for this protocol.
    Err(CanonError::NonFiniteOrFractionalNumber)
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_object(map: &Map<String, Value>, out: &mut String) -> Result<(), CanonError> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));
    out.push('{');
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(key, out);
        out.push(':');
        write_value(&map[*key], out)?;
    }
    out.push('}');
    Ok(())
}

/// Parses `bytes` as JSON and canonicalizes the result without checking that
/// the input was already canonical. Used internally and by callers that only
/// need the parsed value (e.g. schema validation before re-canonicalizing
/// for a signature pre-image).
pub fn parse(bytes: &[u8]) -> Result<Value, CanonError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CanonError::InvalidUtf8)?;
    serde_json::from_str(text).map_err(|e| CanonError::InvalidJson(e.to_string()))
}

/// Parses `bytes` as JSON, then verifies that re-serializing the result in
/// canonical form reproduces `bytes` exactly. Returns the parsed value only
/// if the round trip holds; any non-canonical spacing, key order, or numeric
/// form is reported as [`CanonError::NotCanonical`].
pub fn parse_strict(bytes: &[u8]) -> Result<Value, CanonError> {
    let value = parse(bytes)?;
    let recanonicalized = canonicalize(&value)?;
    if recanonicalized.as_bytes() != bytes {
        return Err(CanonError::NotCanonical);
    }
    Ok(value)
}

/// Recursively removes the given top-level keys (typically the signature
/// field itself) from `value`, and optionally the `meta` field, producing
/// the pre-image used for signing. Only applies to a top-level JSON object;
/// nested objects are left untouched, since the protocol's anchors are
/// always flat.
#[must_use]
pub fn prepare_for_signing(value: &Value, omit_keys: &[&str], exclude_meta: bool) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };
    let mut out = Map::new();
    for (k, v) in map {
        if omit_keys.contains(&k.as_str()) {
            continue;
        }
        if exclude_meta && k == "meta" {
            continue;
        }
        out.insert(k.clone(), v.clone());
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_ordering() {
        let v = json!({"b": 1, "a": 2, "c": 3});
        assert_eq!(canonicalize(&v).unwrap(), r#"{"a":2,"b":1,"c":3}"#);
    }

    #[test]
    fn test_array_order_preserved() {
        let v = json!({"a": [3, 1, 2]});
        assert_eq!(canonicalize(&v).unwrap(), r#"{"a":[3,1,2]}"#);
    }

    #[test]
    fn test_string_escaping() {
        let v = json!({"s": "line\nbreak\tand\"quote\\back"});
        let out = canonicalize(&v).unwrap();
        assert!(out.contains(r"\n"));
        assert!(out.contains(r"\t"));
        assert!(out.contains("\\\""));
        assert!(out.contains(r"\\"));
    }

    #[test]
    fn test_control_char_escape() {
        let v = json!({"s": "\u{1}"});
        assert_eq!(canonicalize(&v).unwrap(), r#"{"s":""}"#);
    }

    #[test]
    fn test_rejects_fractional_number() {
        let v = json!({"n": 1.5});
        assert_eq!(
            canonicalize(&v),
            Err(CanonError::NonFiniteOrFractionalNumber)
        );
    }

    #[test]
    fn test_parse_strict_accepts_canonical() {
        let canonical = r#"{"a":1,"b":2}"#;
        let parsed = parse_strict(canonical.as_bytes()).unwrap();
        assert_eq!(parsed, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_parse_strict_rejects_reordered_keys() {
        let non_canonical = r#"{"b":2,"a":1}"#;
        assert_eq!(
            parse_strict(non_canonical.as_bytes()),
            Err(CanonError::NotCanonical)
        );
    }

    #[test]
    fn test_parse_strict_rejects_extra_whitespace() {
        let non_canonical = r#"{"a": 1}"#;
        assert_eq!(
            parse_strict(non_canonical.as_bytes()),
            Err(CanonError::NotCanonical)
        );
    }

    #[test]
    fn test_round_trip_property() {
        let v = json!({"z": 1, "a": [1,2,3], "m": {"x": true, "y": null}});
        let canonical = canonicalize(&v).unwrap();
        let reparsed = parse_strict(canonical.as_bytes()).unwrap();
        assert_eq!(canonicalize(&reparsed).unwrap(), canonical);
    }

    #[test]
    fn test_prepare_for_signing_omits_keys() {
        let v = json!({"sid": "ab", "sig": "cd", "meta": {"x": 1}});
        let prepared = prepare_for_signing(&v, &["sig"], true);
        assert_eq!(prepared, json!({"sid": "ab"}));
    }

    #[test]
    fn test_prepare_for_signing_keeps_meta_when_not_excluded() {
        let v = json!({"sid": "ab", "sig": "cd", "meta": {"x": 1}});
        let prepared = prepare_for_signing(&v, &["sig"], false);
        assert_eq!(prepared, json!({"sid": "ab", "meta": {"x": 1}}));
    }
}
