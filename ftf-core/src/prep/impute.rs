//! Multivariate iterative imputation.
//!
//! Only columns that contain a missing value (null or NaN) take part. Each of
//! them starts from a per-column initial fill; then, round after round, every
//! incomplete column is regressed on the other incomplete columns and its
//! missing cells are replaced by the predictions. Rounds stop once the largest
//! row-wise change drops below `tol * max(|observed|)` or `max_iter` is reached.
//!
//! Fully observed columns are never read or written.

use ndarray::{Array2, Axis};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::regression::RidgeFit;
use crate::error::{PrepError, PrepResult};
use crate::table::ops::{f64_values, has_missing, is_numeric};

/// Value every missing cell starts from before the first round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialStrategy {
    #[default]
    Mean,
    Median,
}

/// Order in which incomplete columns are visited within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputationOrder {
    /// Fewest missing values first.
    #[default]
    Ascending,
    /// Most missing values first.
    Descending,
    /// Table order, left to right.
    Roman,
    /// Table order, right to left.
    Arabic,
    /// Seeded shuffle, redrawn every round.
    Random,
}

/// What to do when `max_iter` rounds pass without convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergencePolicy {
    /// Log a warning and keep the last estimate.
    #[default]
    Warn,
    /// Fail with `PrepError::Convergence`.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputerConfig {
    pub max_iter: usize,
    pub tol: f64,
    pub seed: u64,
    pub initial_strategy: InitialStrategy,
    pub order: ImputationOrder,
    pub ridge_alpha: f64,
    pub on_non_convergence: ConvergencePolicy,
}

impl Default for ImputerConfig {
    fn default() -> Self {
        Self {
            max_iter: 10,
            tol: 1e-3,
            seed: 42,
            initial_strategy: InitialStrategy::Mean,
            order: ImputationOrder::Ascending,
            ridge_alpha: 1e-3,
            on_non_convergence: ConvergencePolicy::Warn,
        }
    }
}

impl ImputerConfig {
    pub fn validate(&self) -> PrepResult<()> {
        if self.max_iter == 0 {
            return Err(PrepError::InvalidParameter(
                "imputer max_iter must be at least 1".into(),
            ));
        }
        if !self.tol.is_finite() || self.tol < 0.0 {
            return Err(PrepError::InvalidParameter(format!(
                "imputer tol must be a non-negative number, got {}",
                self.tol
            )));
        }
        if !self.ridge_alpha.is_finite() || self.ridge_alpha < 0.0 {
            return Err(PrepError::InvalidParameter(format!(
                "imputer ridge_alpha must be a non-negative number, got {}",
                self.ridge_alpha
            )));
        }
        Ok(())
    }
}

/// What an imputation pass did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationReport {
    /// Columns that had missing values, in table order.
    pub columns: Vec<String>,
    /// Missing cells per entry of `columns`.
    pub missing_counts: Vec<usize>,
    /// Regression rounds run (0 when no model was needed).
    pub iterations: usize,
    pub converged: bool,
    /// Infinity norm of the change made by the last round.
    pub final_delta: f64,
}

impl ImputationReport {
    fn untouched() -> Self {
        Self {
            columns: Vec::new(),
            missing_counts: Vec::new(),
            iterations: 0,
            converged: true,
            final_delta: 0.0,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A table after imputation, together with its report.
#[derive(Debug, Clone)]
pub struct Imputed {
    pub table: DataFrame,
    pub report: ImputationReport,
}

#[derive(Debug, Clone, Default)]
pub struct IterativeImputer {
    config: ImputerConfig,
}

impl IterativeImputer {
    pub fn new(config: ImputerConfig) -> PrepResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ImputerConfig {
        &self.config
    }

    /// Fill every missing value; a table without gaps comes back unchanged.
    pub fn impute(&self, df: DataFrame) -> PrepResult<DataFrame> {
        Ok(self.impute_with_report(df)?.table)
    }

    pub fn impute_with_report(&self, mut df: DataFrame) -> PrepResult<Imputed> {
        let mut names = Vec::new();
        for column in df.get_columns() {
            if !has_missing(column)? {
                continue;
            }
            if !is_numeric(column.dtype()) {
                return Err(PrepError::UnsupportedColumn {
                    column: column.name().to_string(),
                    dtype: column.dtype().clone(),
                });
            }
            names.push(column.name().to_string());
        }

        if names.is_empty() {
            debug!("no missing values, imputation skipped");
            return Ok(Imputed {
                table: df,
                report: ImputationReport::untouched(),
            });
        }

        let height = df.height();
        let mut values = Array2::<f64>::zeros((height, names.len()));
        let mut mask = Array2::from_elem((height, names.len()), false);
        for (j, name) in names.iter().enumerate() {
            let raw = f64_values(&df, name)?;
            let observed: Vec<f64> = raw.iter().flatten().copied().collect();
            if observed.is_empty() {
                return Err(PrepError::EmptyColumn(name.clone()));
            }
            let fill = initial_fill(&observed, self.config.initial_strategy);
            for (r, value) in raw.iter().enumerate() {
                values[[r, j]] = value.unwrap_or(fill);
                mask[[r, j]] = value.is_none();
            }
        }

        let missing_counts: Vec<usize> = mask
            .columns()
            .into_iter()
            .map(|column| column.iter().filter(|&&missing| missing).count())
            .collect();

        // A lone column has nothing to regress on: the initial fill is final.
        let (iterations, converged, final_delta) = if names.len() == 1 {
            (0, true, 0.0)
        } else {
            self.iterate(&mut values, &mask, &missing_counts)?
        };

        for (name, filled) in names.iter().zip(values.columns()) {
            df.with_column(Column::new(name.as_str().into(), filled.to_vec()))?;
        }

        info!(
            columns = ?names,
            iterations,
            converged,
            "imputed missing values"
        );

        Ok(Imputed {
            table: df,
            report: ImputationReport {
                columns: names,
                missing_counts,
                iterations,
                converged,
                final_delta,
            },
        })
    }

    /// Run regression rounds in place. Returns (rounds, converged, last change).
    ///
    /// `values` is rows x incomplete columns; `mask` marks the cells to estimate.
    fn iterate(
        &self,
        values: &mut Array2<f64>,
        mask: &Array2<bool>,
        missing_counts: &[usize],
    ) -> PrepResult<(usize, bool, f64)> {
        let (height, width) = values.dim();

        let scale = values
            .iter()
            .zip(mask.iter())
            .filter(|&(_, &missing)| !missing)
            .map(|(v, _)| v.abs())
            .fold(0.0_f64, f64::max);
        let tolerance = self.config.tol * scale;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut order = self.visit_order(missing_counts);
        let mut delta = f64::INFINITY;

        for round in 1..=self.config.max_iter {
            if self.config.order == ImputationOrder::Random {
                order.shuffle(&mut rng);
            }
            let previous = values.clone();

            for &target in &order {
                let others: Vec<usize> = (0..width).filter(|&k| k != target).collect();
                let (observed, missing): (Vec<usize>, Vec<usize>) =
                    (0..height).partition(|&r| !mask[[r, target]]);

                let predictors = values.select(Axis(1), &others);
                let target_values = values.column(target).select(Axis(0), &observed);
                let fit = RidgeFit::fit(
                    predictors.select(Axis(0), &observed).view(),
                    target_values.view(),
                    self.config.ridge_alpha,
                );
                let predictions = fit.predict(predictors.select(Axis(0), &missing).view());

                for (&row, value) in missing.iter().zip(predictions) {
                    values[[row, target]] = value;
                }
            }

            // Matrix infinity norm of the change: largest absolute row sum.
            delta = (&*values - &previous)
                .mapv(f64::abs)
                .sum_axis(Axis(1))
                .fold(0.0_f64, |acc, &v| acc.max(v));
            debug!(round, delta, tolerance, "imputation round");

            if delta < tolerance {
                return Ok((round, true, delta));
            }
        }

        match self.config.on_non_convergence {
            ConvergencePolicy::Warn => {
                warn!(
                    rounds = self.config.max_iter,
                    delta,
                    tolerance,
                    "imputation hit the round cap before converging, keeping last estimate"
                );
                Ok((self.config.max_iter, false, delta))
            }
            ConvergencePolicy::Error => Err(PrepError::Convergence {
                iterations: self.config.max_iter,
                delta,
                tolerance,
            }),
        }
    }

    fn visit_order(&self, missing_counts: &[usize]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..missing_counts.len()).collect();
        match self.config.order {
            ImputationOrder::Ascending => order.sort_by_key(|&j| missing_counts[j]),
            // Stable ascending sort reversed: ties are visited right to left.
            ImputationOrder::Descending => {
                order.sort_by_key(|&j| missing_counts[j]);
                order.reverse();
            }
            ImputationOrder::Arabic => order.reverse(),
            ImputationOrder::Roman | ImputationOrder::Random => {}
        }
        order
    }
}

fn initial_fill(observed: &[f64], strategy: InitialStrategy) -> f64 {
    match strategy {
        InitialStrategy::Mean => observed.iter().sum::<f64>() / observed.len() as f64,
        InitialStrategy::Median => {
            let mut sorted = observed.to_vec();
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            } else {
                sorted[mid]
            }
        }
    }
}
