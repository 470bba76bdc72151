//! Feed identifiers and the schema registry
//!
//! Every feed is one source CSV with its own native granularity. The registry
//! maps each feed's columns onto the semantic roles the feature engine needs,
//! so feature derivation never has to guess from column names.

use crate::table::TimeTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Source feed identifier, in canonical join order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedId {
    Price,
    ActualConsumption,
    ForecastConsumption,
    ActualGeneration,
    ForecastGeneration,
    CrossBorderFlows,
    ScheduledExchanges,
}

impl FeedId {
    /// All feeds; the first entry is the join base
    pub const ALL: [FeedId; 7] = [
        FeedId::Price,
        FeedId::ActualConsumption,
        FeedId::ForecastConsumption,
        FeedId::ActualGeneration,
        FeedId::ForecastGeneration,
        FeedId::CrossBorderFlows,
        FeedId::ScheduledExchanges,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedId::Price => "price",
            FeedId::ActualConsumption => "actual_consumption",
            FeedId::ForecastConsumption => "forecast_consumption",
            FeedId::ActualGeneration => "actual_generation",
            FeedId::ForecastGeneration => "forecast_generation",
            FeedId::CrossBorderFlows => "cross_border_flows",
            FeedId::ScheduledExchanges => "scheduled_exchanges",
        }
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optimized file name per feed, relative to the data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFiles {
    pub price: String,
    pub actual_consumption: String,
    pub forecast_consumption: String,
    pub actual_generation: String,
    pub forecast_generation: String,
    pub cross_border_flows: String,
    pub scheduled_exchanges: String,
}

impl FeedFiles {
    pub fn file_name(&self, feed: FeedId) -> &str {
        match feed {
            FeedId::Price => &self.price,
            FeedId::ActualConsumption => &self.actual_consumption,
            FeedId::ForecastConsumption => &self.forecast_consumption,
            FeedId::ActualGeneration => &self.actual_generation,
            FeedId::ForecastGeneration => &self.forecast_generation,
            FeedId::CrossBorderFlows => &self.cross_border_flows,
            FeedId::ScheduledExchanges => &self.scheduled_exchanges,
        }
    }
}

impl Default for FeedFiles {
    fn default() -> Self {
        const RANGE: &str = "202301010000_202503050000";
        Self {
            price: format!("optimized_refined_Day-ahead_prices_{RANGE}_Hour.csv"),
            actual_consumption: format!("optimized_refined_Actual_consumption_{RANGE}_Quarterhour.csv"),
            forecast_consumption: format!(
                "optimized_refined_Forecasted_consumption_{RANGE}_Quarterhour.csv"
            ),
            actual_generation: format!("optimized_refined_Actual_generation_{RANGE}_Quarterhour.csv"),
            forecast_generation: format!(
                "optimized_refined_Forecasted_generation_Day-Ahead_{RANGE}_Hour_Quarterhour.csv"
            ),
            cross_border_flows: format!(
                "optimized_refined_Cross-border_physical_flows_{RANGE}_Quarterhour.csv"
            ),
            scheduled_exchanges: format!(
                "optimized_refined_Scheduled_commercial_exchanges_{RANGE}_Quarterhour.csv"
            ),
        }
    }
}

/// Column naming conventions shared by every feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Timestamp key every feed is joined on
    pub timestamp_column: String,
    /// Interval end column, dropped on load
    pub end_column: String,
    /// Substring identifying per-unit-energy price columns in the price feed
    pub price_marker: String,
    /// Total column of the actual generation feed
    pub generation_total: String,
    /// Grid load total column of both consumption feeds
    pub consumption_total: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            timestamp_column: "Start date".to_string(),
            end_column: "End date".to_string(),
            price_marker: "/MWh".to_string(),
            generation_total: "Total [MWh] Original resolutions".to_string(),
            consumption_total: "Total (grid load) [MWh] Original resolutions".to_string(),
        }
    }
}

/// Semantic role of a column within the unified table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnRole {
    Price,
    ForecastGeneration,
    ActualGenerationTotal,
    ActualConsumptionTotal,
    ForecastConsumptionTotal,
}

/// Resolves feed columns to roles once, at load time
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schema: SchemaConfig,
}

impl SchemaRegistry {
    pub fn new(schema: SchemaConfig) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    /// Role carried by `column` when it comes from `feed`
    pub fn role_of(&self, feed: FeedId, column: &str) -> Option<ColumnRole> {
        match feed {
            FeedId::Price if column.contains(self.schema.price_marker.as_str()) => {
                Some(ColumnRole::Price)
            }
            FeedId::ForecastGeneration => Some(ColumnRole::ForecastGeneration),
            FeedId::ActualGeneration if column == self.schema.generation_total => {
                Some(ColumnRole::ActualGenerationTotal)
            }
            FeedId::ActualConsumption if column == self.schema.consumption_total => {
                Some(ColumnRole::ActualConsumptionTotal)
            }
            FeedId::ForecastConsumption if column == self.schema.consumption_total => {
                Some(ColumnRole::ForecastConsumptionTotal)
            }
            _ => None,
        }
    }

    /// Roles of every column of a feed table, parallel to its columns
    pub fn resolve(&self, feed: FeedId, table: &TimeTable) -> Vec<Option<ColumnRole>> {
        table
            .column_names()
            .iter()
            .map(|name| self.role_of(feed, name))
            .collect()
    }
}

/// Role -> final column names in the unified table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSchema {
    roles: BTreeMap<ColumnRole, Vec<String>>,
}

impl ResolvedSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a column for a role; names are kept unique and in insertion order
    pub fn insert(&mut self, role: ColumnRole, name: &str) {
        let names = self.roles.entry(role).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    pub fn columns(&self, role: ColumnRole) -> &[String] {
        self.roles.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First column carrying a single-column role
    pub fn single(&self, role: ColumnRole) -> Option<&str> {
        self.columns(role).first().map(String::as_str)
    }
}
