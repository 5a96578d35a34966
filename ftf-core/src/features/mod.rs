//! Derived trading features.
//!
//! Row-over-row change columns (`Daily Range`, `Volume Change`,
//! `Close Price Increase`) are spliced next to the column they come from; the
//! MACD family is appended at the end of the table. All operations require the
//! table to be in ascending date order.

pub mod changes;
pub mod ema;
pub mod macd;

pub use ema::ewm_mean;
pub use macd::MacdParams;

/// Entry point for every feature operation.
///
/// Each operation takes the table by value and returns it with its column(s)
/// added; running one twice replaces its output instead of duplicating it.
pub struct FeatureDeriver;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for feature tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
