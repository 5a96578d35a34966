//! Structured error type shared by every preparation stage.

use polars::prelude::{DataType, PolarsError};
use thiserror::Error;

/// Errors raised while preparing a price table.
///
/// All of them are deterministic data-shape or parameter problems, so callers
/// should surface them rather than retry.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("cannot parse {column} at row {row}: {value:?}")]
    Parse {
        column: String,
        row: usize,
        value: String,
    },

    #[error(
        "imputation did not converge after {iterations} rounds (change {delta:.6}, tolerance {tolerance:.6})"
    )]
    Convergence {
        iterations: usize,
        delta: f64,
        tolerance: f64,
    },

    #[error("column {column} has unsupported type {dtype:?}")]
    UnsupportedColumn { column: String, dtype: DataType },

    #[error("column {0} has no observed values to impute from")]
    EmptyColumn(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

impl PrepError {
    pub fn missing_column(name: &str) -> Self {
        PrepError::Schema {
            missing: vec![name.to_string()],
        }
    }
}

pub type PrepResult<T> = Result<T, PrepError>;
