use polars::prelude::*;

use crate::error::{PrepError, PrepResult};
use crate::table::columns::{CLOSE, DATE, HIGH, LOW, OPEN, VOLUME};
use crate::table::ops::{is_numeric, require_columns};

/// Input contract for a raw price-history table.
///
/// - Columns: Date, Open, High, Low, Close, Volume (extra columns pass through)
/// - Price and volume columns are numeric; `Date` is checked by the decomposer
/// - Rows ascend by date (not verified here; EMA and pct-change assume it)
pub struct OhlcvSchema;

impl OhlcvSchema {
    pub const REQUIRED: [&'static str; 6] = [DATE, OPEN, HIGH, LOW, CLOSE, VOLUME];
    pub const NUMERIC: [&'static str; 5] = [OPEN, HIGH, LOW, CLOSE, VOLUME];

    /// Validate a DataFrame against the contract.
    pub fn validate(df: &DataFrame) -> PrepResult<()> {
        require_columns(df, &Self::REQUIRED)?;

        for name in Self::NUMERIC {
            let column = df.column(name)?;
            if !is_numeric(column.dtype()) {
                return Err(PrepError::UnsupportedColumn {
                    column: name.to_string(),
                    dtype: column.dtype().clone(),
                });
            }
        }

        Ok(())
    }
}
