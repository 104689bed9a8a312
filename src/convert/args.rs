//! Outbound argument mapping.
//!
//! The engine sends typed positional arguments; the client accepts plain
//! values. Most conversions are passthrough, with three exceptions:
//!
//! - datetime arguments arrive as strings but must serialize differently
//!   depending on the target column's width (DATE, TIME, full timestamp),
//! - JSON arguments arrive pre-serialized and must be parsed back so the
//!   client does not double-encode them,
//! - list arguments must be hand-serialized to a PostgreSQL array literal,
//!   because the client's raw-exec path does not serialize native arrays.
//!
//! Inputs that fail to parse pass through as text: the server rejects them
//! with a proper structured error instead of this layer inventing one.

use std::fmt::Write as _;

use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::value::PgValue;

/// Whether an argument is a single value or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arity {
    #[default]
    Scalar,
    List,
}

/// The engine's scalar argument vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarType {
    #[default]
    Unknown,
    String,
    Int,
    BigInt,
    Float,
    Boolean,
    DateTime,
    Decimal,
    Uuid,
    Json,
    Bytes,
    Enum,
}

/// Physical-type hint overriding the default datetime formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Date,
    Time,
    Timetz,
    Timestamp,
}

/// Per-argument descriptor supplied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgType {
    pub arity: Arity,
    pub scalar: ScalarType,
    pub db_type: Option<DbType>,
}

impl ArgType {
    pub fn scalar(scalar: ScalarType) -> Self {
        Self {
            arity: Arity::Scalar,
            scalar,
            db_type: None,
        }
    }

    pub fn list(scalar: ScalarType) -> Self {
        Self {
            arity: Arity::List,
            scalar,
            db_type: None,
        }
    }

    pub fn with_db_type(mut self, db_type: DbType) -> Self {
        self.db_type = Some(db_type);
        self
    }
}

/// Convert one engine argument into a value the client accepts.
pub fn map_arg(value: PgValue, ty: &ArgType) -> PgValue {
    if value.is_null() {
        return PgValue::Null;
    }
    match ty.arity {
        Arity::List => {
            let items = match value {
                PgValue::Array(items) => items,
                other => vec![other],
            };
            let mapped: Vec<PgValue> = items.into_iter().map(|v| map_scalar(v, ty)).collect();
            PgValue::Text(to_pg_array_literal(&mapped))
        }
        Arity::Scalar => map_scalar(value, ty),
    }
}

fn map_scalar(value: PgValue, ty: &ArgType) -> PgValue {
    if value.is_null() {
        return PgValue::Null;
    }
    match (ty.scalar, value) {
        (ScalarType::DateTime, PgValue::Text(s)) => map_datetime_text(s, ty.db_type),
        (ScalarType::DateTime, PgValue::DateTime(dt)) => {
            PgValue::Text(format_hinted(dt.naive_utc(), ty.db_type))
        }
        // Pre-serialized JSON text: parse back so the client's own
        // serialization does not double-encode it.
        (ScalarType::Json, PgValue::Text(s)) => match serde_json::from_str(&s) {
            Ok(v) => PgValue::Json(v),
            Err(_) => PgValue::Text(s),
        },
        (ScalarType::Bytes, PgValue::Text(s)) => {
            match base64::engine::general_purpose::STANDARD.decode(&s) {
                Ok(bytes) => PgValue::Bytes(bytes),
                Err(_) => PgValue::Text(s),
            }
        }
        (_, other) => other,
    }
}

fn map_datetime_text(s: String, hint: Option<DbType>) -> PgValue {
    match parse_datetime(&s) {
        Some(dt) => PgValue::Text(format_hinted(dt, hint)),
        None => PgValue::Text(s),
    }
}

fn format_hinted(dt: NaiveDateTime, hint: Option<DbType>) -> String {
    match hint {
        Some(DbType::Date) => dt.format("%Y-%m-%d").to_string(),
        Some(DbType::Time) => dt.format("%H:%M:%S%.3f").to_string(),
        Some(DbType::Timetz) => format!("{}+00:00", dt.format("%H:%M:%S%.3f")),
        Some(DbType::Timestamp) | None => dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S%.f") {
        return Some(NaiveDate::from_ymd_opt(1970, 1, 1)?.and_time(t));
    }
    None
}

/// Serialize values to the PostgreSQL `{elem,elem,...}` text format.
///
/// NULL stays unquoted, booleans shorten to `t`/`f`, numbers stay bare,
/// and everything else is stringified and quoted with `\` and `"` escaped.
pub fn to_pg_array_literal(items: &[PgValue]) -> String {
    let mut out = String::with_capacity(items.len() * 8 + 2);
    out.push('{');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match item {
            PgValue::Null => out.push_str("NULL"),
            PgValue::Bool(b) => out.push(if *b { 't' } else { 'f' }),
            PgValue::Number(n) => {
                let _ = write!(out, "{}", n);
            }
            PgValue::BigInt(n) => {
                let _ = write!(out, "{}", n);
            }
            other => push_quoted(&mut out, &element_text(other)),
        }
    }
    out.push('}');
    out
}

fn element_text(value: &PgValue) -> String {
    match value {
        PgValue::Text(s) => s.clone(),
        PgValue::Json(v) => v.to_string(),
        PgValue::DateTime(dt) => format!("{}+00:00", dt.format("%Y-%m-%dT%H:%M:%S%.3f")),
        PgValue::Bytes(b) => {
            let mut s = String::with_capacity(2 + b.len() * 2);
            s.push_str("\\x");
            for byte in b {
                let _ = write!(s, "{:02x}", byte);
            }
            s
        }
        PgValue::Array(items) => to_pg_array_literal(items),
        // Handled by the caller before reaching here.
        PgValue::Null | PgValue::Bool(_) | PgValue::Number(_) | PgValue::BigInt(_) => {
            String::new()
        }
    }
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
}
