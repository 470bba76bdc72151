//! Refine stage: raw exports to time-sorted, comma-delimited files
//!
//! Date-like columns (header contains `date` or `time`) are the only
//! columns touched; every other cell is copied through unchanged.


use crate::error::Result;
use crate::pipeline::StageReport;
use crate::table::{csv_files, format_timestamp, parse_timestamp, RawTable};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Output name prefix of refined files
pub const REFINED_PREFIX: &str = "refined_";

pub struct Refiner {
    source_dir: PathBuf,
    refined_dir: PathBuf,
    delimiter: u8,
}

impl Refiner {
    pub fn new(source_dir: impl Into<PathBuf>, refined_dir: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            source_dir: source_dir.into(),
            refined_dir: refined_dir.into(),
            delimiter,
        }
    }

    /// Refine every CSV in the source directory; per-file failures are
    /// recorded and the remaining files still run
    pub fn run(&self) -> Result<StageReport> {
        std::fs::create_dir_all(&self.refined_dir)?;
        let mut report = StageReport::default();

        for path in csv_files(&self.source_dir)? {
            let name = file_name(&path);
            match self.refine_file(&path, &name) {
                Ok(true) => report.processed.push(name),
                Ok(false) => report.skipped.push(name),
                Err(e) => {
                    error!("Failed to refine {}: {}", name, e);
                    report.failed.push(name);
                }
            }
        }

        info!(
            "Refine: {} processed, {} skipped, {} failed",
            report.processed.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Returns `false` when nothing was left to write
    fn refine_file(&self, path: &Path, name: &str) -> Result<bool> {
        info!("Refining {}", name);
        let raw = RawTable::read_path(path, self.delimiter)?;
        let Some(refined) = refine_table(raw, name) else {
            warn!("{}: no rows with a valid timestamp, skipping", name);
            return Ok(false);
        };

        let out = self.refined_dir.join(format!("{REFINED_PREFIX}{name}"));
        refined.write_path(&out)?;
        debug!("Wrote {} rows to {}", refined.len(), out.display());
        Ok(true)
    }
}

/// Headers that look like timestamps
pub fn date_columns(headers: &[String]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            let h = h.to_lowercase();
            h.contains("date") || h.contains("time")
        })
        .map(|(i, _)| i)
        .collect()
}

/// Parse and re-render the date columns, drop rows with no timestamp at all
/// and sort by the first date column. `None` if no row survives.
pub fn refine_table(mut raw: RawTable, label: &str) -> Option<RawTable> {
    let date_cols = date_columns(&raw.headers);
    if date_cols.is_empty() {
        warn!("{}: no date-like columns found", label);
    } else {
        let names: Vec<&str> = date_cols.iter().map(|&c| raw.headers[c].as_str()).collect();
        info!("{}: date columns {:?}", label, names);
    }

    let parsed: Vec<Vec<Option<NaiveDateTime>>> = raw
        .rows
        .iter()
        .map(|row| {
            date_cols
                .iter()
                .map(|&c| row.get(c).and_then(|cell| parse_timestamp(cell)))
                .collect()
        })
        .collect();

    for (slot, &col) in date_cols.iter().enumerate() {
        let missing = parsed.iter().filter(|p| p[slot].is_none()).count();
        info!("{}: '{}' has {} missing timestamps", label, raw.headers[col], missing);
    }

    let mut rows: Vec<(Vec<Option<NaiveDateTime>>, Vec<String>)> = parsed
        .into_iter()
        .zip(std::mem::take(&mut raw.rows))
        .filter(|(ts, _)| date_cols.is_empty() || ts.iter().any(Option::is_some))
        .collect();

    if !date_cols.is_empty() {
        rows.sort_by_key(|(ts, _)| (ts[0].is_none(), ts[0]));
    }

    raw.rows = rows
        .into_iter()
        .map(|(ts, mut row)| {
            for (slot, &col) in date_cols.iter().enumerate() {
                if let Some(cell) = row.get_mut(col) {
                    *cell = ts[slot].as_ref().map(format_timestamp).unwrap_or_default();
                }
            }
            row
        })
        .collect();

    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
