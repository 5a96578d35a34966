//! Ridge regression used as the per-column estimator of the imputer.
//!
//! Predictors are standardised on the training rows before fitting, so a single
//! `alpha` behaves the same for price-scale and volume-scale columns. Predictors
//! that are constant over the training rows get a zero coefficient.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Spread below which a predictor is treated as constant.
const MIN_SCALE: f64 = 1e-12;

#[derive(Debug, Clone)]
pub(crate) struct RidgeFit {
    intercept: f64,
    /// Coefficients mapped back to raw predictor units.
    weights: Array1<f64>,
    means: Array1<f64>,
}

impl RidgeFit {
    /// Fit `y` on the columns of `x`, one row per training observation.
    ///
    /// With no usable predictor (or a singular system) the fit reduces to the
    /// mean of `y`.
    pub(crate) fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>, alpha: f64) -> Self {
        let p = x.ncols();
        let y_mean = y.mean().unwrap_or(0.0);
        let mut weights = Array1::zeros(p);

        let means = match x.mean_axis(Axis(0)) {
            Some(means) => means,
            None => {
                return Self {
                    intercept: y_mean,
                    weights,
                    means: Array1::zeros(p),
                }
            }
        };
        let scales = x.std_axis(Axis(0), 0.0);
        let active: Vec<usize> = (0..p).filter(|&k| scales[k] > MIN_SCALE).collect();

        if !active.is_empty() {
            let mut z = x.select(Axis(1), &active);
            for (mut column, &k) in z.columns_mut().into_iter().zip(&active) {
                column.mapv_inplace(|v| (v - means[k]) / scales[k]);
            }
            let y_centered = &y - y_mean;

            // Z'Z + alpha I
            let mut gram = z.t().dot(&z);
            gram.diag_mut().mapv_inplace(|d| d + alpha);
            let rhs = z.t().dot(&y_centered);

            if let Some(beta) = solve_cholesky(&gram, &rhs) {
                for (a, &k) in active.iter().enumerate() {
                    weights[k] = beta[a] / scales[k];
                }
            }
        }

        Self {
            intercept: y_mean,
            weights,
            means,
        }
    }

    /// Predict one value per row of `x`.
    pub(crate) fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        (&x - &self.means).dot(&self.weights) + self.intercept
    }
}

/// Solve `a x = b` for symmetric positive-definite `a`. `None` if `a` is not SPD.
fn solve_cholesky(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();

    // a = L L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if !diag.is_finite() || diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * z[j]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward: L^T x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[[j, i]] * x[j]).sum();
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    Some(x)
}
