//! Test Data Generators
//!
//! Deterministic feed tables and CSV files shaped like the market exports

use crate::feed::{FeedId, SchemaConfig};
use crate::merge::FeedTable;
use crate::table::{float_column, format_timestamp, TimeTable};
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub const PRICE_COLUMN: &str = "Germany/Luxembourg [/MWh] Original resolutions";
pub const NEIGHBOUR_PRICE_COLUMN: &str = "France [/MWh] Original resolutions";
pub const NET_EXPORT_COLUMN: &str = "Net export [MWh] Original resolutions";
pub const WIND_COLUMN: &str = "Wind offshore [MWh] Original resolutions";

/// Generator for test data
pub struct TestDataGenerator {
    start: NaiveDateTime,
    schema: SchemaConfig,
    counter: u32,
}

impl TestDataGenerator {
    /// Series starting 2023-01-02 00:00 (a Monday)
    pub fn new() -> Self {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self::starting_at(start)
    }

    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            start,
            schema: SchemaConfig::default(),
            counter: 0,
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Timestamp `hours` after the start
    pub fn at(&self, hours: i64) -> NaiveDateTime {
        self.start + Duration::hours(hours)
    }

    pub fn hourly_index(&self, hours: usize) -> Vec<NaiveDateTime> {
        (0..hours as i64).map(|h| self.at(h)).collect()
    }

    pub fn quarter_hour_index(&self, hours: usize) -> Vec<NaiveDateTime> {
        (0..hours as i64 * 4)
            .map(|q| self.start + Duration::minutes(q * 15))
            .collect()
    }

    /// Single-column feed over the given index
    pub fn feed(
        &self,
        feed: FeedId,
        index: Vec<NaiveDateTime>,
        columns: Vec<(&str, Vec<Option<f64>>)>,
    ) -> FeedTable {
        let columns = columns
            .into_iter()
            .map(|(name, values)| float_column(name, values))
            .collect();
        let table = TimeTable::from_columns(index, columns).unwrap_or_default();
        FeedTable::new(feed, table)
    }

    pub fn price_feed(&self, prices: &[f64]) -> FeedTable {
        self.feed(
            FeedId::Price,
            self.hourly_index(prices.len()),
            vec![(PRICE_COLUMN, prices.iter().copied().map(Some).collect())],
        )
    }

    pub fn actual_generation_feed(&self, totals: &[f64]) -> FeedTable {
        self.feed(
            FeedId::ActualGeneration,
            self.hourly_index(totals.len()),
            vec![(
                self.schema.generation_total.as_str(),
                totals.iter().copied().map(Some).collect(),
            )],
        )
    }

    pub fn forecast_generation_feed(&self, totals: &[f64]) -> FeedTable {
        self.feed(
            FeedId::ForecastGeneration,
            self.hourly_index(totals.len()),
            vec![(
                self.schema.generation_total.as_str(),
                totals.iter().copied().map(Some).collect(),
            )],
        )
    }

    pub fn consumption_feed(&self, feed: FeedId, totals: &[f64]) -> FeedTable {
        self.feed(
            feed,
            self.hourly_index(totals.len()),
            vec![(
                self.schema.consumption_total.as_str(),
                totals.iter().copied().map(Some).collect(),
            )],
        )
    }

    /// All seven feeds over `hours` hours; the non-price feeds are quarter-hourly
    pub fn full_feed_set(&mut self, hours: usize) -> Vec<FeedTable> {
        let hourly = self.hourly_index(hours);
        let quarter = self.quarter_hour_index(hours);
        let q = quarter.len();

        let price_a = (0..hours).map(|_| Some(self.next_value(40.0, 60.0))).collect();
        let price_b = (0..hours).map(|_| Some(self.next_value(35.0, 50.0))).collect();
        let load = (0..q).map(|_| Some(self.next_value(9000.0, 3000.0))).collect();
        let load_forecast = (0..q).map(|_| Some(self.next_value(9000.0, 3000.0))).collect();
        let generation = (0..q).map(|_| Some(self.next_value(8000.0, 4000.0))).collect();
        let generation_forecast = (0..q).map(|_| Some(self.next_value(8000.0, 4000.0))).collect();
        let wind_forecast = (0..q).map(|_| Some(self.next_value(500.0, 1500.0))).collect();
        let flows = (0..q).map(|_| Some(self.next_value(-500.0, 1000.0))).collect();
        let exchanges = (0..q).map(|_| Some(self.next_value(-400.0, 800.0))).collect();

        let generation_total = self.schema.generation_total.clone();
        let consumption_total = self.schema.consumption_total.clone();

        vec![
            self.feed(
                FeedId::Price,
                hourly,
                vec![(PRICE_COLUMN, price_a), (NEIGHBOUR_PRICE_COLUMN, price_b)],
            ),
            self.feed(
                FeedId::ActualConsumption,
                quarter.clone(),
                vec![(consumption_total.as_str(), load)],
            ),
            self.feed(
                FeedId::ForecastConsumption,
                quarter.clone(),
                vec![(consumption_total.as_str(), load_forecast)],
            ),
            self.feed(
                FeedId::ActualGeneration,
                quarter.clone(),
                vec![(generation_total.as_str(), generation)],
            ),
            self.feed(
                FeedId::ForecastGeneration,
                quarter.clone(),
                vec![
                    (generation_total.as_str(), generation_forecast),
                    (WIND_COLUMN, wind_forecast),
                ],
            ),
            self.feed(
                FeedId::CrossBorderFlows,
                quarter.clone(),
                vec![(NET_EXPORT_COLUMN, flows)],
            ),
            self.feed(
                FeedId::ScheduledExchanges,
                quarter,
                vec![(NET_EXPORT_COLUMN, exchanges)],
            ),
        ]
    }

    /// Render a feed as an optimized CSV file, with `Start date` and `End date`
    pub fn feed_csv(&self, feed: &FeedTable) -> String {
        let table = &feed.table;
        let index = table.index().unwrap_or_default();
        let step = match index.as_slice() {
            [first, second, ..] => *second - *first,
            _ => Duration::hours(1),
        };
        let names = table.column_names();
        let columns: Vec<Vec<Option<f64>>> = names
            .iter()
            .map(|name| table.values(name).unwrap_or_default())
            .collect();

        let mut out = format!("{},{}", self.schema.timestamp_column, self.schema.end_column);
        for name in &names {
            out.push(',');
            out.push_str(name);
        }
        out.push('\n');

        for (row, ts) in index.iter().enumerate() {
            out.push_str(&format_timestamp(ts));
            out.push(',');
            out.push_str(&format_timestamp(&(*ts + step)));
            for values in &columns {
                out.push(',');
                match values.get(row).copied().flatten() {
                    Some(v) => out.push_str(&v.to_string()),
                    None => out.push('-'),
                }
            }
            out.push('\n');
        }
        out
    }

    /// Semicolon-separated raw export as published, German date format
    pub fn raw_source_csv(&mut self, hours: usize) -> String {
        let mut out = String::from("Start date;End date;Germany/Luxembourg [€/MWh] Original resolutions\n");
        for h in 0..hours as i64 {
            let start = self.at(h);
            let end = self.at(h + 1);
            let price = self.next_value(40.0, 60.0);
            out.push_str(&format!(
                "{};{};{:.2}\n",
                start.format("%d.%m.%Y %H:%M"),
                end.format("%d.%m.%Y %H:%M"),
                price
            ));
        }
        out
    }

    /// Deterministic value in `[base, base + spread)`
    fn next_value(&mut self, base: f64, spread: f64) -> f64 {
        self.counter += 1;
        let step = (self.counter * 37 + 11) % 100;
        base + spread * step as f64 / 100.0
    }
}

impl Default for TestDataGenerator {
    fn default() -> Self {
        Self::new()
    }
}
