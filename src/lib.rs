//! # pgbridge
//!
//! Adapts a host runtime's pooled PostgreSQL client to the driver
//! contract a query engine expects. The client executes statements and
//! returns untyped rows; the engine wants column type tags, canonical
//! value shapes, and a closed error taxonomy. This crate sits between
//! them.
//!
//! # Architecture
//!
//! Three layers, leaves first:
//!
//! - `types` - the type catalog: OID to column-type mapping, plus
//!   value-based OID inference for the metadata-less path
//! - `convert` - value normalization (inbound) and argument mapping
//!   (outbound, including PostgreSQL array literals)
//! - `driver` - the orchestrator: adapter operations, transaction
//!   handles, result assembly, connection factory
//!
//! The underlying client stays behind the traits in `client`; every error
//! it surfaces is translated by `error::convert_error` before reaching
//! the engine.
//!
//! # Example
//!
//! ```ignore
//! use pgbridge::{ConnectionSource, PgBridge, Query};
//!
//! let bridge = PgBridge::new(
//!     ConnectionSource::Url("postgres://app@localhost/app?schema=public".into()),
//!     builder,
//! );
//! let adapter = bridge.connect().await?;
//! let result = adapter.query_raw(&Query::new("SELECT id, email FROM users")).await?;
//! ```

pub mod client;
pub mod convert;
pub mod driver;
pub mod error;
pub mod types;
pub mod value;

pub use client::{ColumnMeta, QueryResult, ReservedConnection, Row, SqlClient, SqlExecutor};
pub use convert::{map_arg, to_pg_array_literal, ArgType, Arity, DbType, ScalarType};
pub use driver::factory::{ClientBuilder, ConnectionSource, PgBridge, PgConfig};
pub use driver::result::ResultSet;
pub use driver::transaction::{IsolationLevel, Transaction};
pub use driver::{ConnectionInfo, PgAdapter, Query, MAX_BIND_VALUES};
pub use error::{
    convert_error, ClientError, Constraint, DriverError, ErrorKind, Result, ServerError,
};
pub use types::infer::infer_native_type;
pub use types::{column_type_for, ColumnType};
pub use value::PgValue;
