//! Stage orchestration
//!
//! refine -> normalize -> finalize, each run to completion before the next.
//! Finalize loads every feed through [`FeedSource`], merges, derives the
//! features and writes the three resampled views.


use crate::config::Config;
use crate::error::{DatasetError, Result};
use crate::features::{CadenceReport, DuplicatePolicy, FeatureEngine};
use crate::feed::{FeedFiles, FeedId, SchemaConfig, SchemaRegistry};
use crate::merge::{FeedTable, Merger};
use crate::normalize::Normalizer;
use crate::refine::Refiner;
use crate::resample::Exporter;
use crate::table::io::read_time_table_path;
use crate::table::{ReadOptions, TimeTable};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{info, warn};

/// Where feed tables come from
#[cfg_attr(test, mockall::automock)]
pub trait FeedSource {
    fn load(&self, feed: FeedId) -> Result<TimeTable>;
}

/// Reads `<data_dir>/<file name>` for each feed
pub struct CsvFeedSource {
    data_dir: PathBuf,
    files: FeedFiles,
    schema: SchemaConfig,
}

impl CsvFeedSource {
    pub fn new(data_dir: impl Into<PathBuf>, files: FeedFiles, schema: SchemaConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            files,
            schema,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.data_dir, config.feeds.clone(), config.schema.clone())
    }

    pub fn path(&self, feed: FeedId) -> PathBuf {
        self.data_dir.join(self.files.file_name(feed))
    }
}

impl FeedSource for CsvFeedSource {
    fn load(&self, feed: FeedId) -> Result<TimeTable> {
        let path = self.path(feed);
        let options = ReadOptions::new(feed.as_str(), self.schema.timestamp_column.as_str())
            .drop_column(self.schema.end_column.as_str());

        read_time_table_path(&path, &options).map_err(|e| match e {
            DatasetError::Io(io) if io.kind() == ErrorKind::NotFound => {
                DatasetError::MissingFeed(format!("{} ({})", feed, path.display()))
            }
            other => other,
        })
    }
}

/// Files handled by a collaborator stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageReport {
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FinalizeReport {
    pub rows: usize,
    pub columns: usize,
    pub cadence: CadenceReport,
    pub outputs: Vec<PathBuf>,
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn refine(&self) -> Result<StageReport> {
        let delimiter = self.config.refine.delimiter()?;
        Refiner::new(&self.config.source_dir, &self.config.refined_dir, delimiter).run()
    }

    pub fn normalize(&self) -> Result<StageReport> {
        Normalizer::new(&self.config.refined_dir, &self.config.data_dir).run()
    }

    pub fn finalize(&self) -> Result<FinalizeReport> {
        self.finalize_with(&CsvFeedSource::from_config(&self.config))
    }

    pub fn finalize_with(&self, source: &dyn FeedSource) -> Result<FinalizeReport> {
        let mut feeds = Vec::with_capacity(FeedId::ALL.len());
        for feed in FeedId::ALL {
            let mut table = source.load(feed)?;
            if table.is_empty() {
                warn!("Feed {} has no rows after cleanup, skipping", feed);
                continue;
            }
            if self.config.features.duplicate_policy == DuplicatePolicy::KeepFirst {
                let (deduped, dropped) = table.dedup_index()?;
                if dropped > 0 {
                    warn!("Feed {}: dropped {} rows with a repeated timestamp", feed, dropped);
                }
                table = deduped;
            }
            info!(
                "Loaded {}: {} rows, {} columns",
                feed,
                table.len(),
                table.width()
            );
            feeds.push(FeedTable::new(feed, table));
        }

        let registry = || SchemaRegistry::new(self.config.schema.clone());
        let unified = Merger::new(registry()).merge(&feeds)?;
        let output = FeatureEngine::new(self.config.features.clone(), registry()).derive(unified)?;

        let exporter = Exporter::new(&self.config.output_dir, self.config.schema.timestamp_column.as_str());
        let outputs = exporter.export_all(&output.table)?;

        Ok(FinalizeReport {
            rows: output.table.len(),
            columns: output.table.width(),
            cadence: output.cadence,
            outputs,
        })
    }

    /// All three stages in order
    pub fn run(&self) -> Result<FinalizeReport> {
        let refined = self.refine()?;
        if !refined.failed.is_empty() {
            warn!("Refine failed for: {}", refined.failed.join(", "));
        }
        let normalized = self.normalize()?;
        if !normalized.failed.is_empty() {
            warn!("Normalize failed for: {}", normalized.failed.join(", "));
        }
        self.finalize()
    }
}
