//! Feature derivation over the unified table
//!
//! Order matters:
//! 1. index validation (row order must be time order)
//! 2. price aggregate, forecast total, generation imbalance
//! 3. one global median fill
//! 4. price aggregate again, from the filled price columns
//! 5. consumption imbalance and every price-derived window feature
//!
//! Window features are computed from the filled series so they agree with
//! the exported values.

pub mod impute;
pub mod index;


pub use impute::{ColumnMedians, EmptyColumnPolicy, MedianImputer};
pub use index::{validate_index, CadenceGap, CadenceReport, DuplicatePolicy};

use crate::error::{DatasetError, Result};
use crate::feed::{ColumnRole, FeedId, ResolvedSchema, SchemaRegistry};
use crate::merge::UnifiedTable;
use crate::table::TimeTable;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const AVERAGE_PRICE: &str = "Average_Price";
pub const TOTAL_FORECAST_GENERATION: &str = "Total_Forecast_Generation";
pub const GENERATION_IMBALANCE: &str = "Generation_Imbalance";
pub const CONSUMPTION_IMBALANCE: &str = "Consumption_Imbalance";
pub const ROLLING_MEAN_24H: &str = "Rolling_Mean_24h";
pub const ROLLING_MEAN_7D: &str = "Rolling_Mean_7d";
pub const PRICE_DIFF: &str = "Price_Diff";
pub const LAG_1H: &str = "Lag_1h";
pub const LAG_24H: &str = "Lag_24h";
pub const VOLATILITY_24H: &str = "Volatility_24h";
pub const PRICE_CHANGE_1H: &str = "Price_Change_1h";
pub const PRICE_CHANGE_24H: &str = "Price_Change_24h";

const DAY: usize = 24;
const WEEK: usize = 24 * 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Expected distance between consecutive unified rows
    pub cadence_minutes: i64,
    pub duplicate_policy: DuplicatePolicy,
    pub empty_column_policy: EmptyColumnPolicy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            cadence_minutes: 60,
            duplicate_policy: DuplicatePolicy::default(),
            empty_column_policy: EmptyColumnPolicy::default(),
        }
    }
}

/// Feature-complete table plus what was learned while building it
#[derive(Debug, Clone)]
pub struct FeatureOutput {
    pub table: TimeTable,
    pub medians: ColumnMedians,
    pub cadence: CadenceReport,
}

pub struct FeatureEngine {
    config: FeatureConfig,
    registry: SchemaRegistry,
}

impl FeatureEngine {
    pub fn new(config: FeatureConfig, registry: SchemaRegistry) -> Self {
        Self { config, registry }
    }

    pub fn derive(&self, unified: UnifiedTable) -> Result<FeatureOutput> {
        let UnifiedTable { table, schema } = unified;

        let cadence = chrono::Duration::minutes(self.config.cadence_minutes);
        let (table, report) = validate_index(table, self.config.duplicate_policy, cadence)?;

        let price_columns = schema.columns(ColumnRole::Price);
        if price_columns.is_empty() {
            return Err(DatasetError::Config(
                "No valid price columns found in unified table".to_string(),
            ));
        }

        let actual = self.actual_generation_total(&table, &schema)?;
        let mut table = table.with_columns([
            average_price(price_columns)?,
            total_forecast_generation(&forecast_generation_columns(&table, &schema))?,
        ])?;
        table = table.with_columns([
            (col(actual.as_str()) - col(TOTAL_FORECAST_GENERATION)).alias(GENERATION_IMBALANCE)
        ])?;

        let mut protected = price_columns.to_vec();
        protected.extend(schema.columns(ColumnRole::ForecastGeneration).iter().cloned());
        protected.push(AVERAGE_PRICE.to_string());
        let imputer = MedianImputer::new(self.config.empty_column_policy).protect(protected);
        let medians = imputer.fit(&table)?;
        let filled = imputer.apply(&mut table, &medians)?;
        info!("Filled {} missing cells with column medians", filled);

        table = table.with_columns([average_price(price_columns)?])?;

        match consumption_imbalance(&table, &schema) {
            Some(expr) => table = table.with_columns([expr])?,
            None => info!("Consumption totals not present, skipping {}", CONSUMPTION_IMBALANCE),
        }

        table = table.with_columns(price_features())?;

        info!("Derived features: {} rows x {} columns", table.len(), table.width());

        Ok(FeatureOutput {
            table,
            medians,
            cadence: report,
        })
    }

    fn actual_generation_total(&self, table: &TimeTable, schema: &ResolvedSchema) -> Result<String> {
        schema
            .single(ColumnRole::ActualGenerationTotal)
            .filter(|name| table.has_column(name))
            .map(str::to_string)
            .ok_or_else(|| DatasetError::MissingColumn {
                feed: FeedId::ActualGeneration.to_string(),
                column: self.registry.schema().generation_total.clone(),
            })
    }
}

/// Forecast generation columns present in the table
pub fn forecast_generation_columns(table: &TimeTable, schema: &ResolvedSchema) -> Vec<String> {
    schema
        .columns(ColumnRole::ForecastGeneration)
        .iter()
        .filter(|name| table.has_column(name))
        .cloned()
        .collect()
}

/// Row mean over the price columns, skipping missing cells
pub fn average_price(price_columns: &[String]) -> Result<Expr> {
    let columns: Vec<Expr> = price_columns.iter().map(|name| col(name.as_str())).collect();
    Ok(mean_horizontal(columns, true)?.alias(AVERAGE_PRICE))
}

/// Row sum over every column of the forecast generation feed; a row without
/// values sums to 0
pub fn total_forecast_generation(forecast_columns: &[String]) -> Result<Expr> {
    if forecast_columns.is_empty() {
        return Err(DatasetError::Config(
            "No forecast generation columns found".to_string(),
        ));
    }
    let columns: Vec<Expr> = forecast_columns.iter().map(|name| col(name.as_str())).collect();
    Ok(sum_horizontal(columns, true)?
        .fill_null(lit(0.0))
        .alias(TOTAL_FORECAST_GENERATION))
}

/// Actual minus forecast grid load, when both totals are present
pub fn consumption_imbalance(table: &TimeTable, schema: &ResolvedSchema) -> Option<Expr> {
    let actual = schema
        .single(ColumnRole::ActualConsumptionTotal)
        .filter(|name| table.has_column(name))?;
    let forecast = schema
        .single(ColumnRole::ForecastConsumptionTotal)
        .filter(|name| table.has_column(name))?;
    Some((col(actual) - col(forecast)).alias(CONSUMPTION_IMBALANCE))
}

fn window(size: usize, min_periods: usize) -> RollingOptionsFixedWindow {
    RollingOptionsFixedWindow {
        window_size: size,
        min_periods,
        ..Default::default()
    }
}

/// Percentage change against `periods` rows back; a zero base gives a
/// missing value instead of an infinity
fn pct_change(price: Expr, periods: i64) -> Expr {
    let base = price.clone().shift(lit(periods));
    when(base.clone().neq(lit(0.0)))
        .then((price / base - lit(1.0)) * lit(100.0))
        .otherwise(lit(NULL))
        .cast(DataType::Float64)
}

/// Window, lag and change features of the average price, in output order
pub fn price_features() -> Vec<Expr> {
    let price = || col(AVERAGE_PRICE);
    vec![
        price().rolling_mean(window(DAY, 1)).alias(ROLLING_MEAN_24H),
        price().rolling_mean(window(WEEK, 1)).alias(ROLLING_MEAN_7D),
        (price() - price().shift(lit(1i64))).alias(PRICE_DIFF),
        price().shift(lit(1i64)).alias(LAG_1H),
        price().shift(lit(DAY as i64)).alias(LAG_24H),
        price().rolling_std(window(DAY, 2)).alias(VOLATILITY_24H),
        pct_change(price(), 1).alias(PRICE_CHANGE_1H),
        pct_change(price(), DAY as i64).alias(PRICE_CHANGE_24H),
    ]
}
