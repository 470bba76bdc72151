//! Writes the three resampled views

use super::{resample, Resolution};
use crate::error::{DatasetError, Result};
use crate::table::io::write_time_table_path;
use crate::table::TimeTable;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub struct Exporter {
    output_dir: PathBuf,
    timestamp_header: String,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, timestamp_header: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            timestamp_header: timestamp_header.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Resample and write one resolution
    pub fn export(&self, table: &TimeTable, resolution: Resolution) -> Result<PathBuf> {
        let view = resample(table, resolution)?;
        let path = self.output_dir.join(resolution.file_name());
        write_time_table_path(&path, &view, &self.timestamp_header)?;
        info!(
            "Wrote {} data: {} rows -> {}",
            resolution,
            view.len(),
            path.display()
        );
        Ok(path)
    }

    /// Every resolution is attempted; any failure is reported after the others ran
    pub fn export_all(&self, table: &TimeTable) -> Result<Vec<PathBuf>> {
        if let Err(e) = fs::create_dir_all(&self.output_dir) {
            warn!(
                "Could not create output directory {}: {}",
                self.output_dir.display(),
                e
            );
        }

        let mut written = Vec::new();
        let mut failed = Vec::new();
        for resolution in Resolution::ALL {
            match self.export(table, resolution) {
                Ok(path) => written.push(path),
                Err(e) => {
                    error!("Failed to write {} data: {}", resolution, e);
                    failed.push(format!("{} ({})", resolution.file_name(), e));
                }
            }
        }

        if failed.is_empty() {
            Ok(written)
        } else {
            Err(DatasetError::Export { failed })
        }
    }
}

pub fn export_all(
    table: &TimeTable,
    output_dir: &Path,
    timestamp_header: &str,
) -> Result<Vec<PathBuf>> {
    Exporter::new(output_dir, timestamp_header).export_all(table)
}
