//! Per-type value normalization.
//!
//! The underlying client hands values back in whatever shape was cheapest
//! for it: 64-bit columns as decimal strings, JSON columns pre-parsed into
//! native values, timestamps as `Date`-like objects. Each transform below
//! rewrites one of those shapes into the canonical form the engine
//! expects. OIDs with no entry pass through unchanged, as do nulls.
//!
//! All transforms are total: a value that does not match the expected raw
//! shape is passed through rather than rejected here, the same way the
//! source regex-replacements no-op on non-matching input.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::types::{element_oid, oid};
use crate::value::PgValue;

/// Normalize one non-null value for the column identified by `type_oid`.
pub fn normalize_value(type_oid: u32, value: PgValue) -> PgValue {
    if value.is_null() {
        return value;
    }
    // Array columns apply the scalar transform element-wise, preserving
    // nulls positionally.
    if let Some(elem) = element_oid(type_oid) {
        return match value {
            PgValue::Array(items) => PgValue::Array(
                items
                    .into_iter()
                    .map(|item| normalize_value(elem, item))
                    .collect(),
            ),
            other => normalize_value(elem, other),
        };
    }
    match type_oid {
        oid::INT8 => normalize_int8(value),
        oid::NUMERIC => normalize_numeric(value),
        oid::MONEY => normalize_money(value),
        oid::DATE => normalize_date(value),
        oid::TIME => normalize_time(value),
        oid::TIMETZ => normalize_timetz(value),
        oid::TIMESTAMP | oid::TIMESTAMPTZ => normalize_timestamp(value),
        oid::JSON | oid::JSONB => normalize_json(value),
        oid::BYTEA => normalize_bytes(value),
        oid::BIT | oid::VARBIT => normalize_to_text(value),
        oid::UUID => normalize_uuid(value),
        _ => value,
    }
}

/// 64-bit integers must never pass through a 64-bit float.
fn normalize_int8(value: PgValue) -> PgValue {
    match value {
        PgValue::Text(s) => match s.parse::<i64>() {
            Ok(n) => PgValue::BigInt(n),
            Err(_) => PgValue::Text(s),
        },
        PgValue::Number(n) if n.fract() == 0.0 && n.is_finite() => PgValue::BigInt(n as i64),
        other => other,
    }
}

fn normalize_numeric(value: PgValue) -> PgValue {
    match value {
        PgValue::Number(n) => {
            let rendered = Decimal::from_f64(n)
                .map(|d| d.normalize().to_string())
                .unwrap_or_else(|| n.to_string());
            PgValue::Text(rendered)
        }
        PgValue::BigInt(n) => PgValue::Text(n.to_string()),
        other => other,
    }
}

/// `-$1,234.56` becomes `-1234.56`: symbol and grouping removed, sign kept.
fn normalize_money(value: PgValue) -> PgValue {
    match value {
        PgValue::Text(s) => PgValue::Text(s.chars().filter(|c| *c != '$' && *c != ',').collect()),
        other => normalize_numeric(other),
    }
}

fn normalize_date(value: PgValue) -> PgValue {
    match value {
        PgValue::DateTime(dt) => PgValue::Text(dt.format("%Y-%m-%d").to_string()),
        other => other,
    }
}

fn normalize_time(value: PgValue) -> PgValue {
    match value {
        PgValue::DateTime(dt) => PgValue::Text(dt.format("%H:%M:%S%.3f").to_string()),
        other => other,
    }
}

/// Strip the trailing timezone offset from a time-with-offset string.
fn normalize_timetz(value: PgValue) -> PgValue {
    match value {
        PgValue::Text(s) => {
            let trimmed = match s.rfind(['+', '-']) {
                Some(i) if i > 0 => s[..i].to_string(),
                _ => s,
            };
            PgValue::Text(trimmed)
        }
        PgValue::DateTime(dt) => PgValue::Text(dt.format("%H:%M:%S%.3f").to_string()),
        other => other,
    }
}

fn normalize_timestamp(value: PgValue) -> PgValue {
    match value {
        PgValue::DateTime(dt) => PgValue::Text(format_timestamp(&dt)),
        PgValue::Text(s) => PgValue::Text(normalize_timestamp_offset(s)),
        other => other,
    }
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    // A neutral date value carries no zone of its own; render UTC.
    format!("{}+00:00", dt.format("%Y-%m-%dT%H:%M:%S%.3f"))
}

/// Expand `Z` and bare `±HH` offset shorthands to `±HH:MM`.
fn normalize_timestamp_offset(s: String) -> String {
    if let Some(rest) = s.strip_suffix('Z') {
        return format!("{}+00:00", rest);
    }
    if let Some(i) = find_offset_sign(&s) {
        let offset = &s[i + 1..];
        if offset.len() == 2 && offset.bytes().all(|b| b.is_ascii_digit()) {
            return format!("{}:00", s);
        }
    }
    s
}

/// Index of the offset sign, skipping the hyphens of the date part.
fn find_offset_sign(s: &str) -> Option<usize> {
    let from = s.find(['T', ' '])? + 1;
    s[from..].rfind(['+', '-']).map(|i| from + i)
}

/// JSON columns arrive pre-parsed; downstream consumers expect a valid
/// JSON-text string unconditionally, so everything is re-serialized. A
/// bare string (including the empty string) is re-quoted as a JSON string
/// literal, never passed through raw.
fn normalize_json(value: PgValue) -> PgValue {
    PgValue::Text(to_json_value(&value).to_string())
}

fn to_json_value(value: &PgValue) -> serde_json::Value {
    match value {
        PgValue::Null => serde_json::Value::Null,
        PgValue::Bool(b) => (*b).into(),
        PgValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        PgValue::BigInt(n) => (*n).into(),
        PgValue::Text(s) => serde_json::Value::String(s.clone()),
        PgValue::Bytes(b) => {
            use base64::Engine;
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
        PgValue::DateTime(dt) => serde_json::Value::String(format_timestamp(dt)),
        PgValue::Json(v) => v.clone(),
        PgValue::Array(items) => {
            serde_json::Value::Array(items.iter().map(to_json_value).collect())
        }
    }
}

fn normalize_bytes(value: PgValue) -> PgValue {
    match value {
        PgValue::Text(s) => {
            // Hex escape format, e.g. `\x68656c6c6f`.
            if let Some(hex) = s.strip_prefix("\\x") {
                if let Some(bytes) = decode_hex(hex) {
                    return PgValue::Bytes(bytes);
                }
            }
            PgValue::Text(s)
        }
        PgValue::Array(items) => {
            let mut bytes = Vec::with_capacity(items.len());
            for item in &items {
                match item {
                    PgValue::Number(n) if n.fract() == 0.0 && (0.0..=255.0).contains(n) => {
                        bytes.push(*n as u8);
                    }
                    _ => return PgValue::Array(items),
                }
            }
            PgValue::Bytes(bytes)
        }
        other => other,
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

fn normalize_to_text(value: PgValue) -> PgValue {
    match value {
        PgValue::Number(n) => PgValue::Text(n.to_string()),
        PgValue::BigInt(n) => PgValue::Text(n.to_string()),
        PgValue::Bool(b) => PgValue::Text(b.to_string()),
        other => other,
    }
}

fn normalize_uuid(value: PgValue) -> PgValue {
    match value {
        PgValue::Bytes(b) if b.len() == 16 => match uuid::Uuid::from_slice(&b) {
            Ok(u) => PgValue::Text(u.to_string()),
            Err(_) => PgValue::Bytes(b),
        },
        other => normalize_to_text(other),
    }
}
