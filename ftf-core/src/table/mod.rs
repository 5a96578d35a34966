//! Table primitives.
//!
//! A price table is a `polars` `DataFrame`: an ordered list of named columns,
//! one row per trading period. This module adds the handful of operations every
//! stage shares: positional insertion, column lookup and numeric extraction.

pub mod columns;
pub mod ops;
pub mod schema;

pub use ops::{
    append_or_replace, f64_values, has_missing, insert_after, is_numeric, require_column,
    require_columns, require_numeric,
};
pub use schema::OhlcvSchema;
