//! Data preparation: calendar decomposition and missing-value imputation.

pub mod dates;
pub mod impute;
mod regression;

pub use dates::DateDecomposer;
pub use impute::{
    ConvergencePolicy, ImputationOrder, ImputationReport, Imputed, ImputerConfig,
    InitialStrategy, IterativeImputer,
};
