//! Error types for the dataset pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing column '{column}' in feed {feed}")]
    MissingColumn { feed: String, column: String },

    #[error("Missing feed: {0}")]
    MissingFeed(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Timestamp error: {0}")]
    Timestamp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataframe error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Export failed for: {}", failed.join(", "))]
    Export { failed: Vec<String> },
}

pub type Result<T> = std::result::Result<T, DatasetError>;
