//! Row-level change features: daily range, volume change, close direction.

use polars::prelude::*;
use tracing::debug;

use super::FeatureDeriver;
use crate::error::PrepResult;
use crate::table::columns::{
    CLOSE, CLOSE_PRICE_INCREASE, DAILY_RANGE, HIGH, LOW, VOLUME, VOLUME_CHANGE,
};
use crate::table::ops::{f64_values, insert_after, require_columns};

impl FeatureDeriver {
    /// Add `Daily Range` and `Volume Change`, then `Close Price Increase`.
    pub fn extract_changes(df: DataFrame) -> PrepResult<DataFrame> {
        let df = Self::daily_range(df)?;
        let df = Self::volume_change(df)?;
        Self::close_price_increase(df)
    }

    /// `Daily Range = High - Low`, inserted after `Low`.
    pub fn daily_range(mut df: DataFrame) -> PrepResult<DataFrame> {
        require_columns(&df, &[HIGH, LOW])?;
        let highs = f64_values(&df, HIGH)?;
        let lows = f64_values(&df, LOW)?;

        let range: Vec<Option<f64>> = highs
            .iter()
            .zip(&lows)
            .map(|(high, low)| Some((*high)? - (*low)?))
            .collect();

        insert_after(&mut df, LOW, Column::new(DAILY_RANGE.into(), range))?;
        debug!("added {DAILY_RANGE}");
        Ok(df)
    }

    /// Fractional change of `Volume` against the previous row, inserted after
    /// `Volume`. The first row has no predecessor and stays null.
    pub fn volume_change(mut df: DataFrame) -> PrepResult<DataFrame> {
        let volumes = f64_values(&df, VOLUME)?;
        let changes = pct_change(&volumes);

        insert_after(&mut df, VOLUME, Column::new(VOLUME_CHANGE.into(), changes))?;
        debug!("added {VOLUME_CHANGE}");
        Ok(df)
    }

    /// `1` when `Close` rose against the previous row, else `0`, inserted after
    /// `Close`. The first row is `0`, never null.
    pub fn close_price_increase(mut df: DataFrame) -> PrepResult<DataFrame> {
        let closes = f64_values(&df, CLOSE)?;
        let labels = increase_labels(&closes);

        insert_after(&mut df, CLOSE, Column::new(CLOSE_PRICE_INCREASE.into(), labels))?;
        debug!("added {CLOSE_PRICE_INCREASE}");
        Ok(df)
    }
}

/// `(x[t] - x[t-1]) / x[t-1]`; null when either side is missing.
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(values.len());
    if values.is_empty() {
        return result;
    }
    result.push(None);
    result.extend(values.windows(2).map(|pair| {
        let prev = pair[0]?;
        let cur = pair[1]?;
        Some((cur - prev) / prev)
    }));
    result
}

/// `1` if `x[t] > x[t-1]`, else `0`; a missing side compares as not greater.
pub fn increase_labels(values: &[Option<f64>]) -> Vec<i64> {
    let mut result = Vec::with_capacity(values.len());
    if values.is_empty() {
        return result;
    }
    result.push(0);
    result.extend(values.windows(2).map(|pair| match (pair[0], pair[1]) {
        (Some(prev), Some(cur)) if cur > prev => 1,
        _ => 0,
    }));
    result
}
