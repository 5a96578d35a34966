//! Moving Average Convergence Divergence.
//!
//! shortEMA, longEMA = EMA(Close) over the short and long spans
//! MACD             = shortEMA - longEMA
//! signalLine       = EMA(MACD) over the signal span
//! MACD_histogram   = MACD - signalLine
//!
//! The five columns are appended to the table in that order.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ema::ewm_mean;
use super::FeatureDeriver;
use crate::error::{PrepError, PrepResult};
use crate::table::columns::{CLOSE, LONG_EMA, MACD, MACD_HISTOGRAM, SHORT_EMA, SIGNAL_LINE};
use crate::table::ops::{append_or_replace, f64_values};

/// EMA spans for MACD. Defaults are the conventional 12 / 26 / 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub short_window: usize,
    pub long_window: usize,
    pub signal_window: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            short_window: 12,
            long_window: 26,
            signal_window: 9,
        }
    }
}

impl MacdParams {
    pub fn new(short_window: usize, long_window: usize, signal_window: usize) -> PrepResult<Self> {
        let params = Self {
            short_window,
            long_window,
            signal_window,
        };
        params.validate()?;
        Ok(params)
    }

    /// Every span must be at least 1. A short span that is not shorter than the
    /// long one is accepted but logged.
    pub fn validate(&self) -> PrepResult<()> {
        for (label, window) in [
            ("short_window", self.short_window),
            ("long_window", self.long_window),
            ("signal_window", self.signal_window),
        ] {
            if window == 0 {
                return Err(PrepError::InvalidParameter(format!(
                    "MACD {label} must be a positive integer"
                )));
            }
        }
        if self.short_window >= self.long_window {
            warn!(
                short_window = self.short_window,
                long_window = self.long_window,
                "MACD short window is not shorter than the long window"
            );
        }
        Ok(())
    }
}

/// The MACD family computed from one close series.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub short_ema: Vec<Option<f64>>,
    pub long_ema: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl MacdSeries {
    pub fn compute(closes: &[Option<f64>], params: &MacdParams) -> Self {
        let short_ema = ewm_mean(closes, params.short_window);
        let long_ema = ewm_mean(closes, params.long_window);
        let macd = difference(&short_ema, &long_ema);
        let signal = ewm_mean(&macd, params.signal_window);
        let histogram = difference(&macd, &signal);

        Self {
            short_ema,
            long_ema,
            macd,
            signal,
            histogram,
        }
    }
}

impl FeatureDeriver {
    /// Append the MACD family computed with `params`.
    pub fn calculate_macd(df: DataFrame, params: &MacdParams) -> PrepResult<DataFrame> {
        params.validate()?;
        let closes = f64_values(&df, CLOSE)?;
        let series = MacdSeries::compute(&closes, params);
        let mut df = df;

        for (name, values) in [
            (SHORT_EMA, series.short_ema),
            (LONG_EMA, series.long_ema),
            (MACD, series.macd),
            (SIGNAL_LINE, series.signal),
            (MACD_HISTOGRAM, series.histogram),
        ] {
            append_or_replace(&mut df, Column::new(name.into(), values))?;
        }

        debug!(
            short_window = params.short_window,
            long_window = params.long_window,
            signal_window = params.signal_window,
            "added MACD columns"
        );
        Ok(df)
    }

    /// [`FeatureDeriver::calculate_macd`] with the 12 / 26 / 9 defaults.
    pub fn calculate_macd_default(df: DataFrame) -> PrepResult<DataFrame> {
        Self::calculate_macd(df, &MacdParams::default())
    }
}

fn difference(a: &[Option<f64>], b: &[Option<f64>]) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(x, y)| Some((*x)? - (*y)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{assert_approx, DEFAULT_EPSILON};
    use crate::table::columns::MACD_FAMILY;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 10.0 + i as f64).collect()
    }

    fn column(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn default_windows() {
        let params = MacdParams::default();
        assert_eq!(
            (params.short_window, params.long_window, params.signal_window),
            (12, 26, 9)
        );
    }

    #[test]
    fn columns_are_appended_in_order() {
        let df = df!("Close" => ramp(40), "Volume" => &[1.0; 40]).unwrap();
        let out = FeatureDeriver::calculate_macd_default(df).unwrap();
        let names: Vec<String> = out
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut expected = vec!["Close".to_string(), "Volume".to_string()];
        expected.extend(MACD_FAMILY.iter().map(|s| s.to_string()));
        assert_eq!(names, expected);
    }

    #[test]
    fn histogram_is_exact_difference() {
        let df = df!("Close" => ramp(60)).unwrap();
        let out = FeatureDeriver::calculate_macd_default(df).unwrap();

        let close = column(&out, "Close");
        let short = column(&out, "shortEMA");
        let long = column(&out, "longEMA");
        let macd = column(&out, "MACD");
        let signal = column(&out, "signalLine");
        let histogram = column(&out, "MACD_histogram");

        assert_eq!(short[0], close[0]);
        assert_eq!(long[0], close[0]);
        assert_eq!(macd[0], Some(0.0));
        for i in 0..60 {
            assert_eq!(macd[i].unwrap(), short[i].unwrap() - long[i].unwrap());
            assert_eq!(histogram[i].unwrap(), macd[i].unwrap() - signal[i].unwrap());
        }
    }

    #[test]
    fn rising_series_has_positive_macd() {
        let series = MacdSeries::compute(
            &ramp(50).into_iter().map(Some).collect::<Vec<_>>(),
            &MacdParams::default(),
        );
        for value in series.macd.iter().skip(1) {
            assert!(value.unwrap() > 0.0);
        }
    }

    #[test]
    fn short_ema_reacts_faster_to_a_step() {
        let mut closes = vec![Some(100.0); 40];
        closes.extend(vec![Some(110.0); 10]);
        let series = MacdSeries::compute(&closes, &MacdParams::default());

        for i in 40..45 {
            let short_dev = series.short_ema[i].unwrap() - 100.0;
            let long_dev = series.long_ema[i].unwrap() - 100.0;
            assert!(short_dev > long_dev, "row {i}: {short_dev} <= {long_dev}");
        }
        // alpha_short = 2/13 on the first stepped row
        assert_approx(
            series.short_ema[40].unwrap(),
            100.0 + 10.0 * 2.0 / 13.0,
            DEFAULT_EPSILON,
        );
    }

    #[test]
    fn rerun_replaces_columns() {
        let df = df!("Close" => ramp(30)).unwrap();
        let once = FeatureDeriver::calculate_macd_default(df).unwrap();
        let params = MacdParams::new(3, 6, 2).unwrap();
        let twice = FeatureDeriver::calculate_macd(once, &params).unwrap();
        assert_eq!(twice.width(), 6);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(matches!(
            MacdParams::new(0, 26, 9),
            Err(PrepError::InvalidParameter(_))
        ));
        let df = df!("Close" => ramp(5)).unwrap();
        let params = MacdParams {
            signal_window: 0,
            ..MacdParams::default()
        };
        assert!(FeatureDeriver::calculate_macd(df, &params).is_err());
    }

    #[test]
    fn inverted_windows_are_allowed() {
        assert!(MacdParams::new(26, 12, 9).is_ok());
    }

    #[test]
    fn missing_close_is_schema_error() {
        let df = df!("Open" => &[1.0]).unwrap();
        assert!(matches!(
            FeatureDeriver::calculate_macd_default(df),
            Err(PrepError::Schema { .. })
        ));
    }
}
