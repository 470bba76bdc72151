//! Test support
//!
//! Deterministic feed tables and CSV files for unit and integration tests

pub mod generators;

pub use generators::TestDataGenerator;
