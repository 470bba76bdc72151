//! Two-pass median imputation
//!
//! `fit` computes one median per column over the whole table, `apply` fills
//! the gaps. Keeping the statistics as a value makes the fill inspectable and
//! lets the same medians be applied to another table of the same shape.

use crate::error::{DatasetError, Result};
use crate::table::TimeTable;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// What to do with a column that has no value to take a median from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyColumnPolicy {
    /// Fill with 0.0 and log a warning; protected columns are left missing
    Zero,
    /// Abort with a configuration error
    Fail,
    /// Keep the cells missing
    #[default]
    Leave,
}

/// Per-column medians, in table column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMedians {
    medians: Vec<(String, Option<f64>)>,
}

impl ColumnMedians {
    pub fn get(&self, name: &str) -> Option<Option<f64>> {
        self.medians
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, median)| *median)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.medians.iter().map(|(n, m)| (n.as_str(), *m))
    }

    /// Columns without a single available value
    pub fn empty_columns(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, m)| m.is_none())
            .map(|(n, _)| n)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MedianImputer {
    policy: EmptyColumnPolicy,
    /// Left missing by the zero fill
    protected: Vec<String>,
}

impl MedianImputer {
    pub fn new(policy: EmptyColumnPolicy) -> Self {
        Self {
            policy,
            protected: Vec::new(),
        }
    }

    /// Columns an empty-column zero fill must skip
    pub fn protect<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected.extend(names.into_iter().map(Into::into));
        self
    }

    /// Pass 1: one median per column
    pub fn fit(&self, table: &TimeTable) -> Result<ColumnMedians> {
        let mut medians = Vec::with_capacity(table.width());
        for name in table.column_names() {
            let median = table.frame().column(&name)?.f64()?.median();
            medians.push((name, median));
        }
        Ok(ColumnMedians { medians })
    }

    /// Pass 2: fill missing cells; returns the number of cells filled
    pub fn apply(&self, table: &mut TimeTable, medians: &ColumnMedians) -> Result<usize> {
        let missing: Vec<(String, usize)> = table
            .column_names()
            .into_iter()
            .map(|name| {
                let count = table.frame().column(&name).map(|c| c.null_count());
                count.map(|count| (name, count))
            })
            .collect::<PolarsResult<_>>()?;

        if self.policy == EmptyColumnPolicy::Fail {
            if let Some((name, _)) = missing
                .iter()
                .find(|(name, count)| *count > 0 && medians.get(name).flatten().is_none())
            {
                return Err(DatasetError::Config(format!(
                    "column '{}' has no values to compute a median from",
                    name
                )));
            }
        }

        let mut fills = Vec::new();
        let mut filled = 0;
        for (name, count) in missing.into_iter().filter(|(_, count)| *count > 0) {
            let fill = match medians.get(&name).flatten() {
                Some(median) => median,
                None if self.policy == EmptyColumnPolicy::Zero
                    && !self.protected.contains(&name) =>
                {
                    warn!("Column '{}' has no values, filling with 0", name);
                    0.0
                }
                None => {
                    warn!("Column '{}' has no values, leaving it empty", name);
                    continue;
                }
            };

            debug!("Filling {} cells of '{}' with {}", count, name, fill);
            fills.push(col(name.as_str()).fill_null(lit(fill)));
            filled += count;
        }

        if !fills.is_empty() {
            *table = table.with_columns(fills)?;
        }
        Ok(filled)
    }

    pub fn fit_apply(&self, table: &mut TimeTable) -> Result<ColumnMedians> {
        let medians = self.fit(table)?;
        self.apply(table, &medians)?;
        Ok(medians)
    }
}
