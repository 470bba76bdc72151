//! Electricity market dataset builder
//!
//! Turns per-feed market exports (prices, load, generation, cross-border
//! exchanges) into one feature-enriched table, published at hourly, daily
//! and weekly resolution.

pub mod config;
pub mod error;
pub mod features;
pub mod feed;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod refine;
pub mod resample;
pub mod table;
pub mod testing;

#[cfg(test)]
mod error_tests;

pub use config::Config;
pub use error::{DatasetError, Result};
pub use pipeline::{FinalizeReport, Pipeline, StageReport};
