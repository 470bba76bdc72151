//! Configuration management
//!
//! Layers, lowest first: built-in defaults, an optional TOML file,
//! `ENERGY__<SECTION>__<KEY>` variables, then the unprefixed directory
//! variables (`DATA_DIR`, `OUTPUT_DIR`, `SOURCE_DIR`, `REFINED_DIR`).

use crate::error::{DatasetError, Result};
use crate::features::FeatureConfig;
use crate::feed::{FeedFiles, SchemaConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File read when no `--config` is given; absent is fine
pub const DEFAULT_CONFIG_FILE: &str = "energy-dataset.toml";

const DIR_VARS: [(&str, &str); 4] = [
    ("source_dir", "SOURCE_DIR"),
    ("refined_dir", "REFINED_DIR"),
    ("data_dir", "DATA_DIR"),
    ("output_dir", "OUTPUT_DIR"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw `;`-delimited exports
    pub source_dir: PathBuf,
    /// Output of the refine stage
    pub refined_dir: PathBuf,
    /// Optimized per-feed files, read by the finalize stage
    pub data_dir: PathBuf,
    /// Finalized hourly/daily/weekly files
    pub output_dir: PathBuf,
    pub feeds: FeedFiles,
    pub schema: SchemaConfig,
    pub features: FeatureConfig,
    pub refine: RefineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("datasets/source"),
            refined_dir: PathBuf::from("datasets/refined"),
            data_dir: PathBuf::from("datasets/optimized"),
            output_dir: PathBuf::from("datasets/finalized"),
            feeds: FeedFiles::default(),
            schema: SchemaConfig::default(),
            features: FeatureConfig::default(),
            refine: RefineConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Field separator of the raw exports
    pub source_delimiter: String,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            source_delimiter: ";".to_string(),
        }
    }
}

impl RefineConfig {
    pub fn delimiter(&self) -> Result<u8> {
        match self.source_delimiter.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(DatasetError::Config(format!(
                "source_delimiter must be a single byte, got '{}'",
                self.source_delimiter
            ))),
        }
    }
}

impl Config {
    /// Load configuration; an explicit `path` must exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let dirs = DIR_VARS
            .iter()
            .map(|(key, var)| (*key, std::env::var(var).ok()))
            .collect::<Vec<_>>();
        Self::load_with(path, &dirs)
    }

    /// Load with explicit directory overrides in place of the process environment
    pub fn load_with(path: Option<&Path>, dir_overrides: &[(&str, Option<String>)]) -> Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("ENERGY")
                    .separator("__")
                    .try_parsing(true),
            );
        for (key, value) in dir_overrides {
            builder = builder.set_override_option(*key, value.clone())?;
        }

        let mut config: Config = builder.build()?.try_deserialize()?;
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.features.cadence_minutes <= 0 {
            return Err(DatasetError::Config(format!(
                "features.cadence_minutes must be positive, got {}",
                self.features.cadence_minutes
            )));
        }
        self.refine.delimiter()?;
        Ok(())
    }

    fn expand_paths(&mut self) {
        for dir in [
            &mut self.source_dir,
            &mut self.refined_dir,
            &mut self.data_dir,
            &mut self.output_dir,
        ] {
            let expanded = shellexpand::tilde(&dir.to_string_lossy()).into_owned();
            *dir = PathBuf::from(expanded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{DuplicatePolicy, EmptyColumnPolicy};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_dirs() -> Vec<(&'static str, Option<String>)> {
        Vec::new()
    }

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("datasets/optimized"));
        assert_eq!(config.output_dir, PathBuf::from("datasets/finalized"));
        assert_eq!(config.schema.timestamp_column, "Start date");
        assert_eq!(config.features.cadence_minutes, 60);
        assert_eq!(config.refine.delimiter().unwrap(), b';');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let file = toml_file(
            r#"
data_dir = "/tmp/in"

[features]
duplicate_policy = "keep_first"
empty_column_policy = "fail"

[feeds]
price = "prices.csv"
"#,
        );

        let config = Config::load_with(Some(file.path()), &no_dirs()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/in"));
        assert_eq!(config.features.duplicate_policy, DuplicatePolicy::KeepFirst);
        assert_eq!(config.features.empty_column_policy, EmptyColumnPolicy::Fail);
        assert_eq!(config.features.cadence_minutes, 60);
        assert_eq!(config.feeds.price, "prices.csv");
        assert_eq!(
            config.feeds.actual_generation,
            FeedFiles::default().actual_generation
        );
    }

    #[test]
    fn test_rendered_config_round_trips() {
        let mut expected = Config::default();
        expected.output_dir = PathBuf::from("/srv/out");
        expected.schema.price_marker = "EUR/MWh".to_string();
        let file = toml_file(&toml::to_string(&expected).unwrap());

        let config = Config::load_with(Some(file.path()), &no_dirs()).unwrap();
        assert_eq!(config, expected);
    }

    #[test]
    fn test_dir_overrides_win_over_file() {
        let file = toml_file("data_dir = \"/from/file\"\noutput_dir = \"/from/file/out\"\n");
        let overrides = vec![
            ("data_dir", Some("/from/env".to_string())),
            ("output_dir", None),
        ];

        let config = Config::load_with(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/env"));
        assert_eq!(config.output_dir, PathBuf::from("/from/file/out"));
    }

    #[test]
    fn test_tilde_is_expanded() {
        let file = toml_file("source_dir = \"~/raw\"\n");
        let config = Config::load_with(Some(file.path()), &no_dirs()).unwrap();
        assert!(!config.source_dir.to_string_lossy().starts_with('~'));
        assert!(config.source_dir.ends_with("raw"));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let err = Config::load_with(Some(Path::new("/nonexistent/energy.toml")), &no_dirs())
            .unwrap_err();
        assert!(matches!(err, DatasetError::Settings(_)));
    }

    #[test]
    fn test_invalid_delimiter() {
        let file = toml_file("[refine]\nsource_delimiter = \";;\"\n");
        let err = Config::load_with(Some(file.path()), &no_dirs()).unwrap_err();
        assert!(err.to_string().contains("single byte"));
    }

    #[test]
    fn test_invalid_cadence() {
        let file = toml_file("[features]\ncadence_minutes = 0\n");
        let err = Config::load_with(Some(file.path()), &no_dirs()).unwrap_err();
        assert!(matches!(err, DatasetError::Config(_)));
    }
}
