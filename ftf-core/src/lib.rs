//! FTF Core: turns a raw daily price history into a model-ready feature table.
//!
//! - Calendar decomposition of `Date` (year, month, weekday, quarter)
//! - Multivariate iterative imputation of missing numeric values
//! - Trading features: daily range, volume change, close direction, MACD
//! - CSV / Parquet table I/O and plot request packaging
//!
//! The table is a `polars` `DataFrame`; every stage takes it by value and
//! returns it with columns added or filled, never reordering rows.

pub mod config;
pub mod error;
pub mod features;
pub mod io;
pub mod pipeline;
pub mod plot;
pub mod prep;
pub mod table;

pub use config::{MacdConfig, PipelineConfig};
pub use error::{PrepError, PrepResult};
pub use features::{FeatureDeriver, MacdParams};
pub use pipeline::{Pipeline, PipelineOutput};
pub use plot::{PlotKind, PlotSpec};
pub use prep::{DateDecomposer, ImputationReport, ImputerConfig, IterativeImputer};
