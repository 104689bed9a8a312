//! PostgreSQL type catalog.
//!
//! Maps native type OIDs to the closed column-type enumeration the query
//! engine understands, and infers an OID from a runtime value when the
//! client exposes no column metadata (see [`infer`]).
//!
//! OID reference: https://github.com/postgres/postgres/blob/master/src/include/catalog/pg_type.dat

pub mod infer;

use crate::error::{DriverError, Result};

/// PostgreSQL type OIDs for the built-in types this catalog covers.
#[allow(dead_code)]
pub mod oid {
    // Boolean
    pub const BOOL: u32 = 16;

    // Bytes
    pub const BYTEA: u32 = 17;

    // Characters
    pub const CHAR: u32 = 18;
    pub const NAME: u32 = 19;
    pub const BPCHAR: u32 = 1042; // blank-padded char
    pub const VARCHAR: u32 = 1043;

    // Integers
    pub const INT8: u32 = 20; // bigint
    pub const INT2: u32 = 21; // smallint
    pub const INT4: u32 = 23; // integer
    pub const OID: u32 = 26;
    pub const XID: u32 = 28;

    // Text
    pub const TEXT: u32 = 25;
    pub const XML: u32 = 142;
    pub const INET: u32 = 869;
    pub const CIDR: u32 = 650;

    // JSON
    pub const JSON: u32 = 114;
    pub const JSONB: u32 = 3802;

    // Float
    pub const FLOAT4: u32 = 700;
    pub const FLOAT8: u32 = 701;

    // Numeric
    pub const NUMERIC: u32 = 1700;
    pub const MONEY: u32 = 790;

    // Date/Time
    pub const DATE: u32 = 1082;
    pub const TIME: u32 = 1083;
    pub const TIMETZ: u32 = 1266;
    pub const TIMESTAMP: u32 = 1114;
    pub const TIMESTAMPTZ: u32 = 1184;

    // Bit strings
    pub const BIT: u32 = 1560;
    pub const VARBIT: u32 = 1562;

    // UUID
    pub const UUID: u32 = 2950;

    // Arrays (defined separately from their element types)
    pub const BOOL_ARRAY: u32 = 1000;
    pub const BYTEA_ARRAY: u32 = 1001;
    pub const CHAR_ARRAY: u32 = 1002;
    pub const NAME_ARRAY: u32 = 1003;
    pub const INT2_ARRAY: u32 = 1005;
    pub const INT4_ARRAY: u32 = 1007;
    pub const TEXT_ARRAY: u32 = 1009;
    pub const XID_ARRAY: u32 = 1011;
    pub const BPCHAR_ARRAY: u32 = 1014;
    pub const VARCHAR_ARRAY: u32 = 1015;
    pub const INT8_ARRAY: u32 = 1016;
    pub const FLOAT4_ARRAY: u32 = 1021;
    pub const FLOAT8_ARRAY: u32 = 1022;
    pub const OID_ARRAY: u32 = 1028;
    pub const INET_ARRAY: u32 = 1041;
    pub const CIDR_ARRAY: u32 = 651;
    pub const MONEY_ARRAY: u32 = 791;
    pub const XML_ARRAY: u32 = 143;
    pub const JSON_ARRAY: u32 = 199;
    pub const DATE_ARRAY: u32 = 1182;
    pub const TIME_ARRAY: u32 = 1183;
    pub const TIMETZ_ARRAY: u32 = 1270;
    pub const TIMESTAMP_ARRAY: u32 = 1115;
    pub const TIMESTAMPTZ_ARRAY: u32 = 1185;
    pub const NUMERIC_ARRAY: u32 = 1231;
    pub const BIT_ARRAY: u32 = 1561;
    pub const VARBIT_ARRAY: u32 = 1563;
    pub const UUID_ARRAY: u32 = 2951;
    pub const JSONB_ARRAY: u32 = 3807;
}

/// OIDs at or above this value are user-defined types (enums, composites,
/// domains) and collapse to `Text`.
pub const USER_DEFINED_OID_START: u32 = 10_000;

/// The closed column-type enumeration the query engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int32,
    Int64,
    Float,
    Double,
    Boolean,
    Text,
    Character,
    Date,
    Time,
    DateTime,
    Numeric,
    Json,
    Uuid,
    Bytes,
    Int32Array,
    Int64Array,
    FloatArray,
    DoubleArray,
    BooleanArray,
    TextArray,
    CharacterArray,
    DateArray,
    TimeArray,
    DateTimeArray,
    NumericArray,
    JsonArray,
    UuidArray,
    BytesArray,
}

/// Map a native type OID to the engine-facing column type.
///
/// Total over the OID space: every built-in OID has an explicit entry in
/// the scalar or array table, user-defined OIDs collapse to `Text`, and a
/// built-in OID missing from both tables is a hard error rather than a
/// silent default.
pub fn column_type_for(type_oid: u32) -> Result<ColumnType> {
    if let Some(ty) = scalar_column_type(type_oid).or_else(|| array_column_type(type_oid)) {
        return Ok(ty);
    }
    if type_oid >= USER_DEFINED_OID_START {
        return Ok(ColumnType::Text);
    }
    Err(DriverError::unsupported_native_type(type_oid))
}

fn scalar_column_type(type_oid: u32) -> Option<ColumnType> {
    let ty = match type_oid {
        oid::INT2 | oid::INT4 => ColumnType::Int32,
        oid::INT8 | oid::OID | oid::XID => ColumnType::Int64,
        oid::FLOAT4 => ColumnType::Float,
        oid::FLOAT8 => ColumnType::Double,
        oid::BOOL => ColumnType::Boolean,
        oid::CHAR | oid::BPCHAR => ColumnType::Character,
        oid::TEXT | oid::VARCHAR | oid::NAME | oid::XML | oid::INET | oid::CIDR | oid::BIT
        | oid::VARBIT => ColumnType::Text,
        oid::DATE => ColumnType::Date,
        oid::TIME | oid::TIMETZ => ColumnType::Time,
        oid::TIMESTAMP | oid::TIMESTAMPTZ => ColumnType::DateTime,
        oid::NUMERIC | oid::MONEY => ColumnType::Numeric,
        oid::JSON | oid::JSONB => ColumnType::Json,
        oid::UUID => ColumnType::Uuid,
        oid::BYTEA => ColumnType::Bytes,
        _ => return None,
    };
    Some(ty)
}

fn array_column_type(type_oid: u32) -> Option<ColumnType> {
    let ty = match type_oid {
        oid::INT2_ARRAY | oid::INT4_ARRAY => ColumnType::Int32Array,
        oid::INT8_ARRAY | oid::OID_ARRAY | oid::XID_ARRAY => ColumnType::Int64Array,
        oid::FLOAT4_ARRAY => ColumnType::FloatArray,
        oid::FLOAT8_ARRAY => ColumnType::DoubleArray,
        oid::BOOL_ARRAY => ColumnType::BooleanArray,
        oid::CHAR_ARRAY | oid::BPCHAR_ARRAY => ColumnType::CharacterArray,
        oid::TEXT_ARRAY | oid::VARCHAR_ARRAY | oid::NAME_ARRAY | oid::XML_ARRAY
        | oid::INET_ARRAY | oid::CIDR_ARRAY | oid::BIT_ARRAY | oid::VARBIT_ARRAY => {
            ColumnType::TextArray
        }
        oid::DATE_ARRAY => ColumnType::DateArray,
        oid::TIME_ARRAY | oid::TIMETZ_ARRAY => ColumnType::TimeArray,
        oid::TIMESTAMP_ARRAY | oid::TIMESTAMPTZ_ARRAY => ColumnType::DateTimeArray,
        oid::NUMERIC_ARRAY | oid::MONEY_ARRAY => ColumnType::NumericArray,
        oid::JSON_ARRAY | oid::JSONB_ARRAY => ColumnType::JsonArray,
        oid::UUID_ARRAY => ColumnType::UuidArray,
        oid::BYTEA_ARRAY => ColumnType::BytesArray,
        _ => return None,
    };
    Some(ty)
}

/// Element OID for an array OID, when this catalog knows the pairing.
pub fn element_oid(type_oid: u32) -> Option<u32> {
    let elem = match type_oid {
        oid::BOOL_ARRAY => oid::BOOL,
        oid::BYTEA_ARRAY => oid::BYTEA,
        oid::CHAR_ARRAY => oid::CHAR,
        oid::NAME_ARRAY => oid::NAME,
        oid::INT2_ARRAY => oid::INT2,
        oid::INT4_ARRAY => oid::INT4,
        oid::TEXT_ARRAY => oid::TEXT,
        oid::XID_ARRAY => oid::XID,
        oid::BPCHAR_ARRAY => oid::BPCHAR,
        oid::VARCHAR_ARRAY => oid::VARCHAR,
        oid::INT8_ARRAY => oid::INT8,
        oid::FLOAT4_ARRAY => oid::FLOAT4,
        oid::FLOAT8_ARRAY => oid::FLOAT8,
        oid::OID_ARRAY => oid::OID,
        oid::INET_ARRAY => oid::INET,
        oid::CIDR_ARRAY => oid::CIDR,
        oid::MONEY_ARRAY => oid::MONEY,
        oid::XML_ARRAY => oid::XML,
        oid::JSON_ARRAY => oid::JSON,
        oid::DATE_ARRAY => oid::DATE,
        oid::TIME_ARRAY => oid::TIME,
        oid::TIMETZ_ARRAY => oid::TIMETZ,
        oid::TIMESTAMP_ARRAY => oid::TIMESTAMP,
        oid::TIMESTAMPTZ_ARRAY => oid::TIMESTAMPTZ,
        oid::NUMERIC_ARRAY => oid::NUMERIC,
        oid::BIT_ARRAY => oid::BIT,
        oid::VARBIT_ARRAY => oid::VARBIT,
        oid::UUID_ARRAY => oid::UUID,
        oid::JSONB_ARRAY => oid::JSONB,
        _ => return None,
    };
    Some(elem)
}

/// Array OID for a scalar OID, used when inferring array-valued columns.
pub fn array_oid_for(scalar_oid: u32) -> u32 {
    match scalar_oid {
        oid::BOOL => oid::BOOL_ARRAY,
        oid::BYTEA => oid::BYTEA_ARRAY,
        oid::INT4 => oid::INT4_ARRAY,
        oid::INT8 => oid::INT8_ARRAY,
        oid::FLOAT8 => oid::FLOAT8_ARRAY,
        oid::NUMERIC => oid::NUMERIC_ARRAY,
        oid::MONEY => oid::MONEY_ARRAY,
        oid::TIME => oid::TIME_ARRAY,
        oid::TIMETZ => oid::TIMETZ_ARRAY,
        oid::TIMESTAMPTZ => oid::TIMESTAMPTZ_ARRAY,
        oid::BIT => oid::BIT_ARRAY,
        oid::UUID => oid::UUID_ARRAY,
        oid::JSON => oid::JSON_ARRAY,
        oid::JSONB => oid::JSONB_ARRAY,
        _ => oid::TEXT_ARRAY,
    }
}

/// Whether an OID is one of the known array OIDs.
pub fn is_array_oid(type_oid: u32) -> bool {
    element_oid(type_oid).is_some()
}
