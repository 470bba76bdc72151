//! Calendar resampling of the feature table
//!
//! Buckets are aligned to the calendar (hour, midnight, Monday 00:00). Hourly
//! and daily buckets are labelled by their start, weekly buckets by their
//! closing Sunday. Each cell is the mean of the available values in the
//! bucket; buckets without rows are omitted.

pub mod export;

#[cfg(test)]
mod tests;

pub use export::{export_all, Exporter};

use crate::error::Result;
use crate::table::{TimeTable, INDEX_COLUMN};
use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};
use polars::prelude::*;
use polars::series::IsSorted;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Hourly,
    Daily,
    Weekly,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Hourly, Resolution::Daily, Resolution::Weekly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Hourly => "hourly",
            Resolution::Daily => "daily",
            Resolution::Weekly => "weekly",
        }
    }

    /// Output file name for this resolution
    pub fn file_name(&self) -> String {
        format!("finalized_{}_data.csv", self.as_str())
    }

    /// Start of the bucket containing `ts`
    pub fn bucket_start(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let date = ts.date();
        match self {
            Resolution::Hourly => NaiveTime::from_hms_opt(ts.hour(), 0, 0)
                .map(|t| date.and_time(t))
                .unwrap_or(ts),
            Resolution::Daily => date.and_time(NaiveTime::MIN),
            Resolution::Weekly => {
                let monday =
                    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()));
                monday.and_time(NaiveTime::MIN)
            }
        }
    }

    /// Timestamp written for the bucket starting at `start`
    pub fn label(&self, start: NaiveDateTime) -> NaiveDateTime {
        match self {
            Resolution::Weekly => start + chrono::Duration::days(6),
            Resolution::Hourly | Resolution::Daily => start,
        }
    }

    fn every(&self) -> &'static str {
        match self {
            Resolution::Hourly => "1h",
            Resolution::Daily => "1d",
            Resolution::Weekly => "1w",
        }
    }

    fn window(&self) -> DynamicGroupOptions {
        let every = Duration::parse(self.every());
        DynamicGroupOptions {
            every,
            period: every,
            offset: Duration::parse("0ns"),
            label: Label::Left,
            include_boundaries: false,
            closed_window: ClosedWindow::Left,
            start_by: StartBy::WindowBound,
            ..Default::default()
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mean of every column per calendar bucket, in bucket order
pub fn resample(table: &TimeTable, resolution: Resolution) -> Result<TimeTable> {
    let means: Vec<Expr> = table
        .column_names()
        .iter()
        .map(|name| col(name.as_str()).mean())
        .collect();

    let frame = table
        .lazy()
        .with_column(col(INDEX_COLUMN).set_sorted_flag(IsSorted::Ascending))
        .group_by_dynamic(col(INDEX_COLUMN), Vec::<Expr>::new(), resolution.window())
        .agg(means)
        .collect()?;
    let buckets = TimeTable::from_frame(frame)?;

    match resolution {
        Resolution::Weekly => {
            let labels = buckets
                .index()?
                .into_iter()
                .map(|start| resolution.label(start))
                .collect();
            buckets.with_index(labels)
        }
        Resolution::Hourly | Resolution::Daily => Ok(buckets),
    }
}
