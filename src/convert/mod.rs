//! Value conversion between the underlying client and the query engine.
//!
//! - `normalize` rewrites inbound row values into the canonical shape the
//!   engine expects for each column type.
//! - `args` converts the engine's outbound typed arguments into values the
//!   client accepts, including PostgreSQL array-literal serialization.

pub mod args;
pub mod normalize;

pub use args::{map_arg, to_pg_array_literal, ArgType, Arity, DbType, ScalarType};
pub use normalize::normalize_value;
