//! Runtime value model shared by both sides of the bridge.
//!
//! The underlying client exposes no per-column metadata, so everything it
//! hands back arrives as one of these shapes. The same enum carries the
//! canonical values after normalization: an INT8 column always becomes
//! `BigInt`, temporal columns become formatted `Text`, JSON columns become
//! JSON-text `Text`, and so on.

use chrono::{DateTime, Utc};

/// A single untyped value, before or after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum PgValue {
    Null,
    Bool(bool),
    /// A plain floating-point number. Integral values within the signed
    /// 32-bit range classify as INT4, outside it as INT8.
    Number(f64),
    /// A value the client already widened to 64 bits.
    BigInt(i64),
    Text(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    /// A JSON column the client auto-parsed into a native value.
    Json(serde_json::Value),
    Array(Vec<PgValue>),
}

impl PgValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PgValue::Null)
    }

    /// Borrow the string contents, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PgValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for PgValue {
    fn from(b: bool) -> Self {
        PgValue::Bool(b)
    }
}

impl From<f64> for PgValue {
    fn from(n: f64) -> Self {
        PgValue::Number(n)
    }
}

impl From<i32> for PgValue {
    fn from(n: i32) -> Self {
        PgValue::Number(n as f64)
    }
}

impl From<i64> for PgValue {
    fn from(n: i64) -> Self {
        PgValue::BigInt(n)
    }
}

impl From<&str> for PgValue {
    fn from(s: &str) -> Self {
        PgValue::Text(s.to_string())
    }
}

impl From<String> for PgValue {
    fn from(s: String) -> Self {
        PgValue::Text(s)
    }
}

impl From<serde_json::Value> for PgValue {
    fn from(v: serde_json::Value) -> Self {
        PgValue::Json(v)
    }
}

impl From<Vec<u8>> for PgValue {
    fn from(bytes: Vec<u8>) -> Self {
        PgValue::Bytes(bytes)
    }
}

impl From<Vec<PgValue>> for PgValue {
    fn from(items: Vec<PgValue>) -> Self {
        PgValue::Array(items)
    }
}
