//! Column names used across the pipeline.

pub const DATE: &str = "Date";
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";

pub const YEAR: &str = "Year";
pub const MONTH: &str = "Month";
pub const DAY_OF_WEEK: &str = "Day of Week";
pub const QUARTER: &str = "Quarter";

pub const DAILY_RANGE: &str = "Daily Range";
pub const VOLUME_CHANGE: &str = "Volume Change";
pub const CLOSE_PRICE_INCREASE: &str = "Close Price Increase";

pub const SHORT_EMA: &str = "shortEMA";
pub const LONG_EMA: &str = "longEMA";
pub const MACD: &str = "MACD";
pub const SIGNAL_LINE: &str = "signalLine";
pub const MACD_HISTOGRAM: &str = "MACD_histogram";

/// Calendar columns in the order they follow `Date`.
pub const CALENDAR: [&str; 4] = [YEAR, MONTH, DAY_OF_WEEK, QUARTER];

/// MACD family in the order it is appended.
pub const MACD_FAMILY: [&str; 5] = [SHORT_EMA, LONG_EMA, MACD, SIGNAL_LINE, MACD_HISTOGRAM];
