//! Result-set assembly.
//!
//! When the client reports column metadata it is authoritative. Otherwise
//! column names come from the shape of the first row, and each column's
//! type is inferred from its first non-null value across all rows. An
//! empty or all-null result produces zero columns and zero rows, never an
//! error.

use crate::client::{QueryResult, Row};
use crate::convert::normalize_value;
use crate::error::Result;
use crate::types::infer::infer_native_type;
use crate::types::{column_type_for, oid, ColumnType};
use crate::value::PgValue;

/// The typed result handed to the query engine.
///
/// Invariant: `column_names`, `column_types`, and every row have the same
/// length.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub column_names: Vec<String>,
    pub column_types: Vec<ColumnType>,
    pub rows: Vec<Vec<PgValue>>,
}

/// Assign column types and normalize every value.
pub fn build_result_set(result: QueryResult) -> Result<ResultSet> {
    let descriptors = match &result.columns {
        Some(columns) => columns
            .iter()
            .map(|c| (c.name.clone(), c.type_oid))
            .collect(),
        None => infer_columns(&result.rows),
    };

    let mut column_names = Vec::with_capacity(descriptors.len());
    let mut column_types = Vec::with_capacity(descriptors.len());
    let mut oids = Vec::with_capacity(descriptors.len());
    for (name, type_oid) in descriptors {
        column_types.push(column_type_for(type_oid)?);
        column_names.push(name);
        oids.push(type_oid);
    }

    let rows = result
        .rows
        .into_iter()
        .map(|row| normalize_row(row, &oids))
        .collect();

    Ok(ResultSet {
        column_names,
        column_types,
        rows,
    })
}

/// Affected-row count for a mutating statement.
pub fn affected_rows(result: &QueryResult) -> u64 {
    result
        .affected_rows
        .unwrap_or(result.rows.len() as u64)
}

fn normalize_row(row: Row, oids: &[u32]) -> Vec<PgValue> {
    let mut values: Vec<PgValue> = row.into_iter().map(|(_, value)| value).collect();
    values.resize(oids.len(), PgValue::Null);
    values
        .into_iter()
        .zip(oids)
        .map(|(value, type_oid)| normalize_value(*type_oid, value))
        .collect()
}

/// Fallback column derivation for metadata-less results.
fn infer_columns(rows: &[Row]) -> Vec<(String, u32)> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    first
        .iter()
        .enumerate()
        .map(|(i, (name, _))| {
            let type_oid = rows
                .iter()
                .find_map(|row| match row.get(i) {
                    Some((_, value)) if !value.is_null() => Some(infer_native_type(value)),
                    _ => None,
                })
                .unwrap_or(oid::TEXT);
            (name.clone(), type_oid)
        })
        .collect()
}
