//! Timestamp index validation
//!
//! Windowed features count rows, so the index must be strictly increasing
//! before they run. Gaps in the cadence are reported, not repaired.

use crate::error::{DatasetError, Result};
use crate::table::{format_timestamp, TimeTable};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Handling of repeated timestamps in the unified table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Abort with a data error
    Reject,
    /// Keep the first row of a repeated timestamp and log the rest
    #[default]
    KeepFirst,
}

/// Two consecutive rows further apart than the expected cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceGap {
    /// Row index of the later timestamp
    pub row: usize,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl CadenceGap {
    pub fn span(&self) -> Duration {
        self.to - self.from
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CadenceReport {
    pub rows: usize,
    pub duplicates_dropped: usize,
    pub gaps: Vec<CadenceGap>,
}

impl CadenceReport {
    pub fn is_regular(&self) -> bool {
        self.gaps.is_empty()
    }
}

/// Check the index is time-ordered; repeated timestamps follow `policy`
pub fn validate_index(
    table: TimeTable,
    policy: DuplicatePolicy,
    cadence: Duration,
) -> Result<(TimeTable, CadenceReport)> {
    let index = table.index()?;
    let mut keep = Vec::with_capacity(index.len());
    let mut last: Option<NaiveDateTime> = None;

    for (row, ts) in index.iter().enumerate() {
        if let Some(last) = last {
            if *ts < last {
                return Err(DatasetError::Data(format!(
                    "timestamps out of order at row {}: {} after {}",
                    row,
                    format_timestamp(ts),
                    format_timestamp(&last)
                )));
            }
            if *ts == last {
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(DatasetError::Data(format!(
                            "duplicate timestamp {} at row {}",
                            format_timestamp(ts),
                            row
                        )));
                    }
                    DuplicatePolicy::KeepFirst => continue,
                }
            }
        }
        keep.push(row);
        last = Some(*ts);
    }

    let duplicates = index.len() - keep.len();
    let (table, index) = if duplicates > 0 {
        warn!("Dropped {} rows with duplicate timestamps", duplicates);
        let kept = keep.iter().map(|&r| index[r]).collect::<Vec<_>>();
        (table.take_rows(&keep)?, kept)
    } else {
        (table, index)
    };

    let gaps: Vec<CadenceGap> = index
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[1] - pair[0] != cadence)
        .map(|(i, pair)| CadenceGap {
            row: i + 1,
            from: pair[0],
            to: pair[1],
        })
        .collect();

    for gap in &gaps {
        warn!(
            "Cadence gap at row {}: {} -> {} ({} min, expected {} min)",
            gap.row,
            format_timestamp(&gap.from),
            format_timestamp(&gap.to),
            gap.span().num_minutes(),
            cadence.num_minutes()
        );
    }

    let report = CadenceReport {
        rows: table.len(),
        duplicates_dropped: duplicates,
        gaps,
    };
    Ok((table, report))
}
