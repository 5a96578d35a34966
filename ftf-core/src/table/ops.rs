use polars::prelude::*;

use crate::error::{PrepError, PrepResult};

/// Primitive numeric dtypes the pipeline can compute on.
pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Look up a column, mapping absence to a schema error naming it.
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> PrepResult<&'a Column> {
    df.column(name).map_err(|_| PrepError::missing_column(name))
}

/// Check that every named column is present, reporting all absent ones at once.
pub fn require_columns(df: &DataFrame, names: &[&str]) -> PrepResult<()> {
    let missing: Vec<String> = names
        .iter()
        .filter(|name| df.get_column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PrepError::Schema { missing })
    }
}

/// Look up a column and check it holds numbers.
pub fn require_numeric<'a>(df: &'a DataFrame, name: &str) -> PrepResult<&'a Column> {
    let column = require_column(df, name)?;
    if !is_numeric(column.dtype()) {
        return Err(PrepError::UnsupportedColumn {
            column: name.to_string(),
            dtype: column.dtype().clone(),
        });
    }
    Ok(column)
}

/// Read a numeric column as `f64`, with nulls and NaNs both reported as `None`.
pub fn f64_values(df: &DataFrame, name: &str) -> PrepResult<Vec<Option<f64>>> {
    let column = require_numeric(df, name)?;
    let cast = column.cast(&DataType::Float64)?;
    let values = cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Whether a column holds at least one null (or NaN, for float columns).
pub fn has_missing(column: &Column) -> PrepResult<bool> {
    if column.null_count() > 0 {
        return Ok(true);
    }
    match column.dtype() {
        DataType::Float32 | DataType::Float64 => {
            let cast = column.cast(&DataType::Float64)?;
            let any_nan = cast.f64()?.into_iter().flatten().any(f64::is_nan);
            Ok(any_nan)
        }
        _ => Ok(false),
    }
}

/// Place `column` immediately after `anchor`.
///
/// A column of the same name already in the table is removed first, so
/// re-running a stage moves its output instead of duplicating it.
pub fn insert_after(df: &mut DataFrame, anchor: &str, column: Column) -> PrepResult<()> {
    let name = column.name().clone();
    if name.as_str() != anchor && df.get_column_index(name.as_str()).is_some() {
        df.drop_in_place(name.as_str())?;
    }

    let index = df
        .get_column_index(anchor)
        .ok_or_else(|| PrepError::missing_column(anchor))?;
    df.insert_column(index + 1, column)?;
    Ok(())
}

/// Append `column` at the end, or overwrite it in place if the name exists.
pub fn append_or_replace(df: &mut DataFrame, column: Column) -> PrepResult<()> {
    df.with_column(column)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn insert_after_splices_next_to_anchor() {
        let mut df = df!(
            "a" => &[1.0, 2.0],
            "b" => &[3.0, 4.0],
            "c" => &[5.0, 6.0],
        )
        .unwrap();

        insert_after(&mut df, "a", Column::new("x".into(), &[0.0, 0.0])).unwrap();
        assert_eq!(names(&df), vec!["a", "x", "b", "c"]);

        insert_after(&mut df, "c", Column::new("y".into(), &[0.0, 0.0])).unwrap();
        assert_eq!(names(&df), vec!["a", "x", "b", "c", "y"]);
    }

    #[test]
    fn insert_after_moves_existing_column() {
        let mut df = df!(
            "a" => &[1.0],
            "x" => &[9.0],
            "b" => &[2.0],
        )
        .unwrap();

        insert_after(&mut df, "b", Column::new("x".into(), &[7.0])).unwrap();
        assert_eq!(names(&df), vec!["a", "b", "x"]);
        assert_eq!(df.column("x").unwrap().f64().unwrap().get(0), Some(7.0));
    }

    #[test]
    fn insert_after_unknown_anchor_is_schema_error() {
        let mut df = df!("a" => &[1.0]).unwrap();
        let err = insert_after(&mut df, "zzz", Column::new("x".into(), &[0.0])).unwrap_err();
        assert!(matches!(err, PrepError::Schema { .. }));
    }

    #[test]
    fn require_columns_reports_all_missing() {
        let df = df!("High" => &[1.0]).unwrap();
        match require_columns(&df, &["High", "Low", "Close"]) {
            Err(PrepError::Schema { missing }) => assert_eq!(missing, vec!["Low", "Close"]),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn f64_values_treats_nan_as_missing() {
        let df = df!("v" => &[Some(1.0), None, Some(f64::NAN)]).unwrap();
        assert_eq!(f64_values(&df, "v").unwrap(), vec![Some(1.0), None, None]);
    }

    #[test]
    fn f64_values_widens_integers() {
        let df = df!("v" => &[100i64, 150]).unwrap();
        assert_eq!(f64_values(&df, "v").unwrap(), vec![Some(100.0), Some(150.0)]);
    }

    #[test]
    fn f64_values_rejects_strings() {
        let df = df!("v" => &["a", "b"]).unwrap();
        assert!(matches!(
            f64_values(&df, "v"),
            Err(PrepError::UnsupportedColumn { .. })
        ));
    }

    #[test]
    fn has_missing_sees_nulls_and_nans() {
        let df = df!(
            "nulls" => &[Some(1.0), None],
            "nans" => &[1.0, f64::NAN],
            "full" => &[1.0, 2.0],
        )
        .unwrap();
        assert!(has_missing(df.column("nulls").unwrap()).unwrap());
        assert!(has_missing(df.column("nans").unwrap()).unwrap());
        assert!(!has_missing(df.column("full").unwrap()).unwrap());
    }

    #[test]
    fn append_or_replace_keeps_position() {
        let mut df = df!("a" => &[1.0], "b" => &[2.0]).unwrap();
        append_or_replace(&mut df, Column::new("a".into(), &[5.0])).unwrap();
        append_or_replace(&mut df, Column::new("c".into(), &[6.0])).unwrap();
        assert_eq!(names(&df), vec!["a", "b", "c"]);
        assert_eq!(df.column("a").unwrap().f64().unwrap().get(0), Some(5.0));
    }
}
