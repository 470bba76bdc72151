//! CSV reading and writing for `TimeTable`

use super::timestamp::{parse_timestamp, TIMESTAMP_FORMAT};
use super::{float_column, TimeTable, INDEX_COLUMN};
use crate::error::{DatasetError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;
use tracing::debug;

/// How to turn a CSV file into a `TimeTable`
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Name used in errors and logs (feed id or file name)
    pub label: String,
    /// Header of the timestamp column, after header cleanup
    pub timestamp_column: String,
    /// Headers to discard, after header cleanup
    pub drop_columns: Vec<String>,
    pub delimiter: u8,
}

impl ReadOptions {
    pub fn new(label: impl Into<String>, timestamp_column: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            timestamp_column: timestamp_column.into(),
            drop_columns: Vec::new(),
            delimiter: b',',
        }
    }

    pub fn drop_column(mut self, name: impl Into<String>) -> Self {
        self.drop_columns.push(name.into());
        self
    }
}

/// Trim a header and strip non-ASCII characters (`€/MWh` becomes `/MWh`)
pub fn clean_header(header: &str) -> String {
    header.trim().chars().filter(char::is_ascii).collect()
}

/// Numeric coercion: `-`, empty, NaN and unparseable cells are missing
pub fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell == "-" {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| !v.is_nan())
}

pub fn format_number(value: f64) -> String {
    value.to_string()
}

/// Read a table; rows whose timestamp does not parse are skipped.
///
/// Every column is read as text first, so numeric coercion and timestamp
/// parsing follow the same rules whatever the file contains.
pub fn read_time_table<R: Read>(mut reader: R, options: &ReadOptions) -> Result<TimeTable> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let mut frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_separator(options.delimiter))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    let headers: Vec<String> = frame
        .get_column_names()
        .into_iter()
        .map(|name| clean_header(name.as_str()))
        .collect();
    frame.set_column_names(headers.iter().map(String::as_str))?;

    if !headers.contains(&options.timestamp_column) {
        return Err(DatasetError::MissingColumn {
            feed: options.label.clone(),
            column: options.timestamp_column.clone(),
        });
    }

    let parsed: Vec<Option<_>> = frame
        .column(&options.timestamp_column)?
        .str()?
        .into_iter()
        .map(|cell| cell.and_then(parse_timestamp))
        .collect();
    let keep: Vec<usize> = parsed
        .iter()
        .enumerate()
        .filter(|(_, ts)| ts.is_some())
        .map(|(row, _)| row)
        .collect();

    let skipped = parsed.len() - keep.len();
    if skipped > 0 {
        debug!("{}: skipped {} rows without a valid timestamp", options.label, skipped);
        let idx = IdxCa::from_vec("rows".into(), keep.iter().map(|&r| r as IdxSize).collect());
        frame = frame.take(&idx)?;
    }

    let mut columns = Vec::new();
    for name in headers.iter().filter(|h| {
        **h != options.timestamp_column && !options.drop_columns.contains(h) && h.as_str() != INDEX_COLUMN
    }) {
        let values = frame
            .column(name)?
            .str()?
            .into_iter()
            .map(|cell| cell.and_then(parse_number))
            .collect();
        columns.push(float_column(name, values));
    }

    TimeTable::from_columns(parsed.into_iter().flatten().collect(), columns)
}

pub fn read_time_table_path(path: &Path, options: &ReadOptions) -> Result<TimeTable> {
    let file = File::open(path)?;
    read_time_table(file, options)
}

/// Write a table with the timestamp as the leading column; missing cells are empty
pub fn write_time_table<W: io::Write>(
    writer: W,
    table: &TimeTable,
    timestamp_header: &str,
) -> Result<()> {
    let mut frame = table.frame().clone();
    frame.rename(INDEX_COLUMN, timestamp_header.into())?;

    CsvWriter::new(writer)
        .include_header(true)
        .with_datetime_format(Some(TIMESTAMP_FORMAT.to_string()))
        .finish(&mut frame)?;
    Ok(())
}

pub fn write_time_table_path(path: &Path, table: &TimeTable, timestamp_header: &str) -> Result<()> {
    let file = File::create(path)?;
    write_time_table(file, table, timestamp_header)
}
