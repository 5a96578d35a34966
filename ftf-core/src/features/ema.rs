//! Exponential Moving Average, recursive ("adjust = false") form.
//!
//! alpha = 2 / (span + 1)
//! EMA[0] = x[0]; EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1]
//!
//! Missing inputs: leading gaps stay missing; a gap repeats the last average;
//! the first value after `k` missing inputs weighs the last average by
//! `(1 - alpha)^(k + 1)` and renormalises. Strictly sequential in row order.

/// EMA of a series with optional values.
pub fn ewm_mean(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut result = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    // Missing inputs seen since `prev` was last updated.
    let mut gaps = 0;

    for value in values {
        match (*value, prev) {
            (Some(x), None) => {
                prev = Some(x);
                gaps = 0;
            }
            (Some(x), Some(p)) => {
                let ema = if gaps == 0 {
                    alpha * x + decay * p
                } else {
                    let old = decay.powi(gaps + 1);
                    (old * p + alpha * x) / (old + alpha)
                };
                prev = Some(ema);
                gaps = 0;
            }
            (None, Some(_)) => gaps += 1,
            (None, None) => {}
        }
        result.push(prev);
    }

    result
}
