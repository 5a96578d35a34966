//! End-to-end preparation: raw OHLCV table in, model-ready table out.
//!
//! Stage order is fixed: validate → decompose dates → impute → change features
//! → MACD (optional). Every stage preserves the row count.

use polars::prelude::*;
use tracing::{info, info_span};

use crate::config::PipelineConfig;
use crate::error::{PrepError, PrepResult};
use crate::features::FeatureDeriver;
use crate::prep::{DateDecomposer, ImputationReport, IterativeImputer};
use crate::table::OhlcvSchema;

/// Result of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: DataFrame,
    pub imputation: ImputationReport,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    imputer: IterativeImputer,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> PrepResult<Self> {
        config.validate()?;
        let imputer = IterativeImputer::new(config.imputer.clone())?;
        Ok(Self { config, imputer })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, df: DataFrame) -> PrepResult<PipelineOutput> {
        let span = info_span!("prepare", rows = df.height(), cols = df.width());
        let _guard = span.enter();

        OhlcvSchema::validate(&df)?;
        let rows = df.height();

        let df = DateDecomposer::decompose(df)?;
        let imputed = self.imputer.impute_with_report(df)?;
        let df = FeatureDeriver::extract_changes(imputed.table)?;
        let df = if self.config.macd.enabled {
            FeatureDeriver::calculate_macd(df, &self.config.macd.params())?
        } else {
            df
        };

        if df.height() != rows {
            return Err(PrepError::InvalidParameter(format!(
                "row count changed during preparation: {rows} in, {} out",
                df.height()
            )));
        }

        info!(
            rows,
            cols = df.width(),
            imputed = imputed.report.columns.len(),
            "prepared table"
        );
        Ok(PipelineOutput {
            table: df,
            imputation: imputed.report,
        })
    }

    /// [`Pipeline::run`] without the imputation report.
    pub fn prepare(&self, df: DataFrame) -> PrepResult<DataFrame> {
        Ok(self.run(df)?.table)
    }
}
