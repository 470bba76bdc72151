//! In-memory tables
//!
//! - `TimeTable`: a polars `DataFrame` whose first column is the datetime
//!   index, followed by `Float64` value columns
//! - `RawTable`: text grid used by the refine/normalize stages before columns
//!   have a type

pub mod io;
pub mod raw;
pub mod timestamp;


pub use io::{read_time_table, write_time_table, ReadOptions};
pub use raw::{csv_files, RawTable};
pub use timestamp::{format_timestamp, parse_timestamp};

use crate::error::{DatasetError, Result};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::HashSet;

/// Name of the index column inside every `TimeTable` frame
pub const INDEX_COLUMN: &str = "timestamp";

/// Named `Float64` column; `None` marks a missing value
pub fn float_column(name: &str, values: Vec<Option<f64>>) -> Column {
    Column::from(Series::new(name.into(), values))
}

fn index_column(index: Vec<NaiveDateTime>) -> Column {
    DatetimeChunked::from_naive_datetime(INDEX_COLUMN.into(), index, TimeUnit::Milliseconds)
        .into_column()
}

/// Timestamp-indexed numeric table
#[derive(Debug, Clone)]
pub struct TimeTable {
    frame: DataFrame,
}

impl TimeTable {
    /// Wrap a frame that carries a naive datetime `INDEX_COLUMN`; the index is
    /// moved to the front
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        let index = frame.column(INDEX_COLUMN).map_err(|_| {
            DatasetError::Timestamp(format!("frame has no '{}' column", INDEX_COLUMN))
        })?;
        if !matches!(index.dtype(), DataType::Datetime(_, None)) {
            return Err(DatasetError::Timestamp(format!(
                "'{}' has type {}, expected a naive datetime",
                INDEX_COLUMN,
                index.dtype()
            )));
        }
        if index.null_count() > 0 {
            return Err(DatasetError::Timestamp(format!(
                "'{}' has {} missing values",
                INDEX_COLUMN,
                index.null_count()
            )));
        }

        let frame = if frame.get_column_names()[0].as_str() == INDEX_COLUMN {
            frame
        } else {
            let mut order = vec![INDEX_COLUMN.to_string()];
            order.extend(
                frame
                    .get_column_names()
                    .into_iter()
                    .filter(|n| n.as_str() != INDEX_COLUMN)
                    .map(|n| n.to_string()),
            );
            frame.select(order)?
        };
        Ok(Self { frame })
    }

    /// Build a table from an index and value columns of the same length
    pub fn from_columns(index: Vec<NaiveDateTime>, columns: Vec<Column>) -> Result<Self> {
        let mut all = Vec::with_capacity(columns.len() + 1);
        all.push(index_column(index));
        all.extend(columns);
        Ok(Self {
            frame: DataFrame::new(all)?,
        })
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Number of value columns
    pub fn width(&self) -> usize {
        self.frame.width().saturating_sub(1)
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn lazy(&self) -> LazyFrame {
        self.frame.clone().lazy()
    }

    pub fn index(&self) -> Result<Vec<NaiveDateTime>> {
        self.frame
            .column(INDEX_COLUMN)?
            .datetime()?
            .as_datetime_iter()
            .enumerate()
            .map(|(row, ts)| {
                ts.ok_or_else(|| DatasetError::Timestamp(format!("missing index value at row {row}")))
            })
            .collect()
    }

    /// Value column names, in order
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .filter(|n| n.as_str() != INDEX_COLUMN)
            .map(|n| n.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        name != INDEX_COLUMN && self.frame.column(name).is_ok()
    }

    pub fn values(&self, name: &str) -> Option<Vec<Option<f64>>> {
        if name == INDEX_COLUMN {
            return None;
        }
        let values = self.frame.column(name).ok()?.f64().ok()?;
        Some(values.into_iter().collect())
    }

    /// Evaluate expressions over the frame; a result named like an existing
    /// column replaces it in place, others are appended in order
    pub fn with_columns<E: AsRef<[Expr]>>(&self, exprs: E) -> Result<Self> {
        let frame = self.lazy().with_columns(exprs).collect()?;
        Self::from_frame(frame)
    }

    /// Same rows with a new index
    pub fn with_index(&self, index: Vec<NaiveDateTime>) -> Result<Self> {
        let mut frame = self.frame.clone();
        frame.with_column(index_column(index))?;
        Ok(Self { frame })
    }

    /// New table made of the given rows, in the given order
    pub fn take_rows(&self, rows: &[usize]) -> Result<Self> {
        let idx = IdxCa::from_vec(
            "rows".into(),
            rows.iter().map(|&r| r as IdxSize).collect(),
        );
        Ok(Self {
            frame: self.frame.take(&idx)?,
        })
    }

    /// Keep the first row of every timestamp; returns the number dropped
    pub fn dedup_index(self) -> Result<(Self, usize)> {
        let index = self.index()?;
        let mut seen = HashSet::with_capacity(index.len());
        let keep: Vec<usize> = index
            .iter()
            .enumerate()
            .filter(|(_, ts)| seen.insert(**ts))
            .map(|(row, _)| row)
            .collect();

        let dropped = index.len() - keep.len();
        if dropped == 0 {
            return Ok((self, 0));
        }
        Ok((self.take_rows(&keep)?, dropped))
    }
}

impl Default for TimeTable {
    fn default() -> Self {
        let frame = DataFrame::new(vec![index_column(Vec::new())]).unwrap_or_else(|_| DataFrame::empty());
        Self { frame }
    }
}

impl PartialEq for TimeTable {
    fn eq(&self, other: &Self) -> bool {
        self.frame.equals_missing(&other.frame)
    }
}
