//! Value-based native-type inference.
//!
//! The underlying client returns rows with no per-column metadata, so the
//! bridge has to reconstruct a plausible OID from the values themselves.
//! Classification is order-sensitive: string patterns overlap, and the
//! first match wins.
//!
//! The 32/64-bit split sits exactly at ±2^31. The client serializes 64-bit
//! columns as decimal strings to avoid precision loss, so a digit-only
//! string inside that range is text, while one outside it is a genuine
//! INT8 value. Moving this boundary silently corrupts numeric results on
//! the round trip through the engine.

use super::{array_oid_for, oid};
use crate::value::PgValue;

/// Infer a native type OID from a runtime value.
pub fn infer_native_type(value: &PgValue) -> u32 {
    match value {
        // Nothing better to say about a NULL; null propagation is handled
        // by the caller.
        PgValue::Null => oid::TEXT,
        PgValue::Bool(_) => oid::BOOL,
        PgValue::BigInt(_) => oid::INT8,
        PgValue::Number(n) => infer_number(*n),
        PgValue::DateTime(_) => oid::TIMESTAMPTZ,
        PgValue::Bytes(_) => oid::BYTEA,
        PgValue::Json(_) => oid::JSONB,
        PgValue::Array(items) => infer_array(items),
        PgValue::Text(s) => infer_string(s),
    }
}

fn infer_number(n: f64) -> u32 {
    if !n.is_finite() || n.fract() != 0.0 {
        return oid::FLOAT8;
    }
    if (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&n) {
        oid::INT4
    } else {
        oid::INT8
    }
}

/// Array inference inspects the first non-null element.
///
/// Objects and nested arrays are the output of JSON-aggregate functions:
/// the client auto-parses the aggregate into a native array, which must be
/// re-flattened to a single JSONB scalar. The engine has no array-of-JSON
/// column type in this dialect.
fn infer_array(items: &[PgValue]) -> u32 {
    let Some(first) = items.iter().find(|v| !v.is_null()) else {
        return oid::TEXT_ARRAY;
    };
    match first {
        PgValue::Json(_) | PgValue::Array(_) => oid::JSONB,
        other => array_oid_for(infer_native_type(other)),
    }
}

fn infer_string(s: &str) -> u32 {
    if is_bit_string(s) {
        oid::BIT
    } else if is_uuid(s) {
        oid::UUID
    } else if is_time_with_offset(s) {
        oid::TIMETZ
    } else if is_plain_time(s) {
        oid::TIME
    } else if is_money(s) {
        oid::MONEY
    } else if is_int8_string(s) {
        oid::INT8
    } else if is_decimal_string(s) {
        oid::NUMERIC
    } else if is_json_container(s) {
        oid::JSON
    } else {
        oid::TEXT
    }
}

fn is_bit_string(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b == b'0' || b == b'1')
}

fn is_uuid(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        8 | 13 | 18 | 23 => *b == b'-',
        _ => b.is_ascii_hexdigit(),
    })
}

/// `HH:MM:SS` with an optional fractional part, no timezone offset.
fn is_plain_time(s: &str) -> bool {
    let (main, frac) = match s.split_once('.') {
        Some((m, f)) => (m, Some(f)),
        None => (s, None),
    };
    let parts: Vec<&str> = main.split(':').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit()))
        && frac.map_or(true, |f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

/// A plain time followed by a `±HH` or `±HH:MM` offset.
fn is_time_with_offset(s: &str) -> bool {
    match s.rfind(['+', '-']) {
        Some(i) if i > 0 => {
            let (time, offset) = s.split_at(i);
            let offset = &offset[1..];
            is_plain_time(time)
                && matches!(offset.len(), 2 | 5)
                && offset
                    .bytes()
                    .enumerate()
                    .all(|(j, b)| if j == 2 { b == b':' } else { b.is_ascii_digit() })
        }
        _ => false,
    }
}

/// `$`-prefixed currency with two decimals, optional comma grouping, and a
/// minus allowed before or after the symbol.
fn is_money(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    let Some(s) = s.strip_prefix('$') else {
        return false;
    };
    let s = s.strip_prefix('-').unwrap_or(s);
    let Some((whole, cents)) = s.rsplit_once('.') else {
        return false;
    };
    cents.len() == 2
        && cents.bytes().all(|b| b.is_ascii_digit())
        && !whole.is_empty()
        && !whole.starts_with(',')
        && !whole.ends_with(',')
        && whole.bytes().all(|b| b.is_ascii_digit() || b == b',')
}

/// Digit-only string whose magnitude or digit count exceeds the signed
/// 32-bit range. Inside the range the string stays text.
fn is_int8_string(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    s.parse::<i32>().is_err()
}

fn is_decimal_string(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let Some((whole, frac)) = body.split_once('.') else {
        return false;
    };
    !whole.is_empty()
        && !frac.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && frac.bytes().all(|b| b.is_ascii_digit())
}

/// PostgreSQL array literals also begin with `{`; requiring a successful
/// parse whose result is an object or array is the disambiguator.
fn is_json_container(s: &str) -> bool {
    if !s.starts_with(['{', '[']) {
        return false;
    }
    match serde_json::from_str::<serde_json::Value>(s) {
        Ok(v) => v.is_object() || v.is_array(),
        Err(_) => false,
    }
}
