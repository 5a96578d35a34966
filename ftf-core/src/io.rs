//! Table I/O: CSV and Parquet files exchanged with the data-fetch side.
//!
//! Readers keep `Date` as whatever the file holds (text for CSV); calendar
//! normalisation happens in [`crate::prep::DateDecomposer`].

use polars::prelude::*;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::PrepResult;

pub fn read_csv(path: &Path) -> PrepResult<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!(path = %path.display(), rows = df.height(), "read CSV table");
    Ok(df)
}

pub fn write_csv(df: &DataFrame, path: &Path) -> PrepResult<()> {
    let file = fs::File::create(path)?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(&mut df.clone())?;
    debug!(path = %path.display(), rows = df.height(), "wrote CSV table");
    Ok(())
}

pub fn read_parquet(path: &Path) -> PrepResult<DataFrame> {
    let file = fs::File::open(path)?;
    let df = ParquetReader::new(file).finish()?;
    debug!(path = %path.display(), rows = df.height(), "read Parquet table");
    Ok(df)
}

/// Write atomically: the table lands in `<path>.tmp` and is renamed into place.
pub fn write_parquet(df: &DataFrame, path: &Path) -> PrepResult<()> {
    let tmp_path = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp_path)?;
    ParquetWriter::new(file).finish(&mut df.clone())?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    debug!(path = %path.display(), rows = df.height(), "wrote Parquet table");
    Ok(())
}
