//! Normalize stage: fill gaps and min-max scale each refined file
//!
//! A column is numeric when every non-empty cell parses as a number and at
//! least one does. Numeric gaps take the column median, categorical gaps the
//! most frequent value. Numeric columns are then rescaled to `[0, 1]`.

#[cfg(test)]
mod tests;

use crate::error::Result;
use crate::pipeline::StageReport;
use crate::refine::file_name;
use crate::table::io::{format_number, parse_number};
use crate::table::{csv_files, RawTable};
use polars::prelude::{ChunkQuantile, Float64Chunked};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Output name prefix of optimized files
pub const OPTIMIZED_PREFIX: &str = "optimized_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// What happened to one table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeSummary {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
    pub filled: usize,
    /// Categorical columns without a value to take the mode from
    pub unfilled: Vec<String>,
}

pub struct Normalizer {
    refined_dir: PathBuf,
    optimized_dir: PathBuf,
}

impl Normalizer {
    pub fn new(refined_dir: impl Into<PathBuf>, optimized_dir: impl Into<PathBuf>) -> Self {
        Self {
            refined_dir: refined_dir.into(),
            optimized_dir: optimized_dir.into(),
        }
    }

    pub fn run(&self) -> Result<StageReport> {
        std::fs::create_dir_all(&self.optimized_dir)?;
        let mut report = StageReport::default();

        for path in csv_files(&self.refined_dir)? {
            let name = file_name(&path);
            match self.normalize_file(&path, &name) {
                Ok(()) => report.processed.push(name),
                Err(e) => {
                    error!("Failed to normalize {}: {}", name, e);
                    report.failed.push(name);
                }
            }
        }

        info!(
            "Normalize: {} processed, {} failed",
            report.processed.len(),
            report.failed.len()
        );
        Ok(report)
    }

    fn normalize_file(&self, path: &Path, name: &str) -> Result<()> {
        info!("Normalizing {}", name);
        let mut table = RawTable::read_path(path, b',')?;
        let summary = normalize_table(&mut table);
        info!("{}: numeric columns {:?}", name, summary.numeric);
        info!("{}: categorical columns {:?}", name, summary.categorical);
        for column in &summary.unfilled {
            warn!("{}: no mode for categorical column '{}', left unfilled", name, column);
        }

        let out = self.optimized_dir.join(format!("{OPTIMIZED_PREFIX}{name}"));
        table.write_path(&out)?;
        debug!("Wrote {} rows to {}", table.len(), out.display());
        Ok(())
    }
}

fn is_blank(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell == "-"
}

pub fn column_kind(table: &RawTable, col: usize) -> ColumnKind {
    let mut any = false;
    for cell in table.column(col).filter(|c| !is_blank(c)) {
        if parse_number(cell).is_none() {
            return ColumnKind::Categorical;
        }
        any = true;
    }
    if any {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Most frequent non-blank value; ties go to the value seen first
pub fn mode<'a>(cells: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (order, cell) in cells.filter(|c| !is_blank(c)).enumerate() {
        counts.entry(cell).or_insert((0, order)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, oa)), (_, (cb, ob))| ca.cmp(cb).then(ob.cmp(oa)))
        .map(|(cell, _)| cell)
}

/// `(x - min) / (max - min)`; a constant column becomes all zeros
pub fn min_max_scale(values: &mut [f64]) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    for v in values.iter_mut() {
        *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
    }
}

/// Fill and scale every column in place
pub fn normalize_table(table: &mut RawTable) -> NormalizeSummary {
    let mut summary = NormalizeSummary::default();

    for col in 0..table.headers.len() {
        let name = table.headers[col].clone();
        match column_kind(table, col) {
            ColumnKind::Numeric => {
                let parsed: Vec<Option<f64>> = table.column(col).map(parse_number).collect();
                let fill = parsed
                    .iter()
                    .copied()
                    .collect::<Float64Chunked>()
                    .median()
                    .unwrap_or(0.0);
                summary.filled += parsed.iter().filter(|v| v.is_none()).count();

                let mut values: Vec<f64> = parsed.iter().map(|v| v.unwrap_or(fill)).collect();
                min_max_scale(&mut values);
                for (row, value) in table.rows.iter_mut().zip(values) {
                    set_cell(row, col, format_number(value));
                }
                summary.numeric.push(name);
            }
            ColumnKind::Categorical => {
                let fill = mode(table.column(col)).map(str::to_string);
                let blanks = table.column(col).filter(|c| is_blank(c)).count();
                match fill {
                    Some(fill) => {
                        for row in table.rows.iter_mut() {
                            if row.get(col).map_or(true, |c| is_blank(c)) {
                                set_cell(row, col, fill.clone());
                            }
                        }
                        summary.filled += blanks;
                    }
                    None if blanks > 0 => summary.unfilled.push(name.clone()),
                    None => {}
                }
                summary.categorical.push(name);
            }
        }
    }

    summary
}

fn set_cell(row: &mut Vec<String>, col: usize, value: String) {
    if row.len() <= col {
        row.resize(col + 1, String::new());
    }
    row[col] = value;
}
