//! Plot requests handed to an external renderer.
//!
//! The pipeline does not draw anything; it only packages two equal-length
//! series with their labels so a charting front end can render them.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PrepError, PrepResult};
use crate::table::ops::{is_numeric, require_column};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    #[default]
    Line,
    Scatter,
    Bar,
}

impl FromStr for PlotKind {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(PlotKind::Line),
            "scatter" => Ok(PlotKind::Scatter),
            "bar" => Ok(PlotKind::Bar),
            other => Err(PrepError::InvalidParameter(format!(
                "unknown plot type {other:?} (expected line, scatter or bar)"
            ))),
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlotKind::Line => "line",
            PlotKind::Scatter => "scatter",
            PlotKind::Bar => "bar",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: PlotKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

impl PlotSpec {
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> PrepResult<Self> {
        if x.len() != y.len() {
            return Err(PrepError::InvalidParameter(format!(
                "plot series differ in length: x has {}, y has {}",
                x.len(),
                y.len()
            )));
        }
        Ok(Self {
            x,
            y,
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            kind: PlotKind::default(),
            color: None,
            header: None,
        })
    }

    /// Build a spec from two columns of a table, labelled with their names.
    ///
    /// The x column may be numeric or a `Date` (plotted as days since
    /// 1970-01-01). Rows where either value is missing are dropped.
    pub fn from_columns(df: &DataFrame, x_col: &str, y_col: &str) -> PrepResult<Self> {
        let xs = plottable_values(df, x_col)?;
        let ys = plottable_values(df, y_col)?;
        let (x, y): (Vec<f64>, Vec<f64>) = xs
            .into_iter()
            .zip(ys)
            .filter_map(|(x, y)| Some((x?, y?)))
            .unzip();

        Self::new(x, y, format!("{y_col} vs {x_col}"), x_col, y_col)
    }

    pub fn with_kind(mut self, kind: PlotKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn to_json(&self) -> PrepResult<String> {
        serde_json::to_string(self).map_err(|e| PrepError::InvalidParameter(e.to_string()))
    }
}

fn plottable_values(df: &DataFrame, name: &str) -> PrepResult<Vec<Option<f64>>> {
    let column = require_column(df, name)?;
    let numeric = match column.dtype() {
        DataType::Date => column.cast(&DataType::Int32)?.cast(&DataType::Float64)?,
        dtype if is_numeric(dtype) => column.cast(&DataType::Float64)?,
        dtype => {
            return Err(PrepError::UnsupportedColumn {
                column: name.to_string(),
                dtype: dtype.clone(),
            })
        }
    };
    let values = numeric
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}
