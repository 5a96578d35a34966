//! Calendar decomposition of the `Date` column.
//!
//! `Date` is normalised to a polars `Date` and followed by `Year`, `Month`,
//! `Day of Week` (Monday = 0) and `Quarter`, in that order.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use polars::prelude::*;
use tracing::debug;

use crate::error::{PrepError, PrepResult};
use crate::table::columns::{DATE, DAY_OF_WEEK, MONTH, QUARTER, YEAR};
use crate::table::ops::{insert_after, require_column};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01, the polars `Date` epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];
const NAIVE_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMATS: [&str; 3] = ["%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y"];

pub struct DateDecomposer;

impl DateDecomposer {
    /// Normalise `Date` and insert the calendar columns right after it.
    ///
    /// Reads nothing but `Date`; row count and every other column are untouched.
    pub fn decompose(mut df: DataFrame) -> PrepResult<DataFrame> {
        let dates = Self::parse_dates(require_column(&df, DATE)?)?;

        let days: Vec<i32> = dates.iter().map(|d| to_epoch_days(*d)).collect();
        let date_column = Column::new(DATE.into(), days).cast(&DataType::Date)?;
        df.with_column(date_column)?;

        let years: Vec<i32> = dates.iter().map(|d| d.year()).collect();
        let months: Vec<i32> = dates.iter().map(|d| d.month() as i32).collect();
        let weekdays: Vec<i32> = dates
            .iter()
            .map(|d| d.weekday().num_days_from_monday() as i32)
            .collect();
        let quarters: Vec<i32> = months.iter().map(|m| quarter_of(*m)).collect();

        let calendar = [
            (YEAR, years),
            (MONTH, months),
            (DAY_OF_WEEK, weekdays),
            (QUARTER, quarters),
        ];

        let mut anchor = DATE;
        for (name, values) in calendar {
            insert_after(&mut df, anchor, Column::new(name.into(), values))?;
            anchor = name;
        }

        debug!(rows = df.height(), "decomposed Date into calendar columns");
        Ok(df)
    }

    /// Interpret every value of a date-like column as a calendar day.
    pub fn parse_dates(column: &Column) -> PrepResult<Vec<NaiveDate>> {
        let name = column.name().to_string();
        let parse_error = |row: usize, value: String| PrepError::Parse {
            column: name.clone(),
            row,
            value,
        };

        match column.dtype() {
            DataType::String => column
                .str()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| match value {
                    Some(raw) => parse_date_str(raw).ok_or_else(|| parse_error(row, raw.to_string())),
                    None => Err(parse_error(row, "null".to_string())),
                })
                .collect(),
            DataType::Date => {
                let physical = column.cast(&DataType::Int32)?;
                physical
                    .i32()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, value)| {
                        value
                            .and_then(from_epoch_days)
                            .ok_or_else(|| parse_error(row, format!("{value:?}")))
                    })
                    .collect()
            }
            DataType::Datetime(unit, zone) => {
                let unit = *unit;
                let zone = match zone {
                    Some(raw) => Some(Zone::parse(raw.as_str()).ok_or_else(|| {
                        PrepError::UnsupportedColumn {
                            column: name.clone(),
                            dtype: column.dtype().clone(),
                        }
                    })?),
                    None => None,
                };
                let physical = column.cast(&DataType::Int64)?;
                physical
                    .i64()?
                    .into_iter()
                    .enumerate()
                    .map(|(row, value)| {
                        value
                            .and_then(|ts| timestamp_to_utc(ts, unit))
                            .map(|instant| match zone {
                                Some(zone) => zone.local_day(instant),
                                None => instant.date_naive(),
                            })
                            .ok_or_else(|| parse_error(row, format!("{value:?}")))
                    })
                    .collect()
            }
            other => Err(PrepError::UnsupportedColumn {
                column: name.clone(),
                dtype: other.clone(),
            }),
        }
    }
}

/// Parse a date or date-time string; offsets keep their local calendar day.
pub fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.date_naive());
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Calendar quarter (1-4) of a month (1-12).
pub fn quarter_of(month: i32) -> i32 {
    (month - 1) / 3 + 1
}

fn to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - EPOCH_DAYS_FROM_CE
}

fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

/// Time zone attached to a `Datetime` column: an IANA name or a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl Zone {
    fn parse(raw: &str) -> Option<Self> {
        raw.parse::<Tz>()
            .ok()
            .map(Zone::Named)
            .or_else(|| raw.parse::<FixedOffset>().ok().map(Zone::Fixed))
    }

    /// Wall-clock calendar day of `instant` in this zone.
    fn local_day(self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Zone::Named(tz) => instant.with_timezone(&tz).date_naive(),
            Zone::Fixed(offset) => instant.with_timezone(&offset).date_naive(),
        }
    }
}

fn timestamp_to_utc(ts: i64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(ts),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(ts),
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(ts)),
    }
}
