//! Merge & schema reconciliation
//!
//! Joins every feed table onto the price table by timestamp:
//! - inner join, so only timestamps present in every feed survive
//! - a column name already taken gets `_<feed>` appended
//! - a column whose suffixed name is still taken is dropped, so the first
//!   column of every name wins
//!
//! Column roles are resolved per feed before the join and follow their
//! columns through the renames.


use crate::error::{DatasetError, Result};
use crate::feed::{ColumnRole, FeedId, ResolvedSchema, SchemaRegistry};
use crate::table::{TimeTable, INDEX_COLUMN};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// One loaded feed
#[derive(Debug, Clone)]
pub struct FeedTable {
    pub feed: FeedId,
    pub table: TimeTable,
}

impl FeedTable {
    pub fn new(feed: FeedId, table: TimeTable) -> Self {
        Self { feed, table }
    }
}

/// The joined table and the final names of every role
#[derive(Debug, Clone)]
pub struct UnifiedTable {
    pub table: TimeTable,
    pub schema: ResolvedSchema,
}

pub struct Merger {
    registry: SchemaRegistry,
}

impl Merger {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Join all feeds. The price feed is the base whatever its position in
    /// `feeds`; the others are joined in the order given.
    pub fn merge(&self, feeds: &[FeedTable]) -> Result<UnifiedTable> {
        let base = feeds
            .iter()
            .find(|f| f.feed == FeedId::Price)
            .ok_or_else(|| DatasetError::MissingFeed(FeedId::Price.to_string()))?;

        let base_roles = self.registry.resolve(FeedId::Price, &base.table);
        if !base_roles.contains(&Some(ColumnRole::Price)) {
            return Err(DatasetError::Config(format!(
                "No valid price columns found in dataset (expected a column containing '{}')",
                self.registry.schema().price_marker
            )));
        }

        let mut schema = ResolvedSchema::new();
        for (name, role) in base.table.column_names().iter().zip(&base_roles) {
            if let Some(role) = role {
                schema.insert(*role, name);
            }
        }

        let mut table = base.table.clone();
        info!(
            "Join base {}: {} rows, {} columns",
            FeedId::Price,
            table.len(),
            table.width()
        );

        for other in feeds.iter().filter(|f| f.feed != FeedId::Price) {
            let other_roles = self.registry.resolve(other.feed, &other.table);
            let before = table.len();
            let (joined, names) = inner_join(&table, &other.table, other.feed)?;
            table = joined;

            let original = other.table.column_names();
            for ((source, name), role) in original.iter().zip(&names).zip(&other_roles) {
                match name {
                    Some(name) => {
                        if name != source {
                            debug!("Renamed colliding column from {}: {}", other.feed, name);
                        }
                        if let Some(role) = role {
                            schema.insert(*role, name);
                        }
                    }
                    None => info!("Dropped duplicate column from {}: {}", other.feed, source),
                }
            }
            info!(
                "Joined {}: {} -> {} rows, {} columns",
                other.feed,
                before,
                table.len(),
                table.width()
            );
        }

        Ok(UnifiedTable { table, schema })
    }
}

/// Relational inner join on the index; left row order is kept and every
/// matching right row is emitted for each left row.
///
/// A right column whose name is taken gets `_<feed>` appended; if that name
/// is taken too the column is dropped, so the first column of a name wins.
/// Returns the joined table and the final name of each right column, `None`
/// for dropped ones.
pub fn inner_join(
    left: &TimeTable,
    right: &TimeTable,
    feed: FeedId,
) -> Result<(TimeTable, Vec<Option<String>>)> {
    let mut taken: HashSet<String> = left
        .frame()
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();

    let mut selection = vec![col(INDEX_COLUMN)];
    let mut names = Vec::new();
    for name in right.column_names() {
        let target = if taken.contains(&name) {
            format!("{}_{}", name, feed)
        } else {
            name.clone()
        };
        if taken.insert(target.clone()) {
            selection.push(col(name.as_str()).alias(target.as_str()));
            names.push(Some(target));
        } else {
            names.push(None);
        }
    }

    let joined = left
        .lazy()
        .join(
            right.lazy().select(selection),
            [col(INDEX_COLUMN)],
            [col(INDEX_COLUMN)],
            JoinArgs {
                maintain_order: MaintainOrderJoin::Left,
                ..JoinArgs::new(JoinType::Inner)
            },
        )
        .collect()?;

    Ok((TimeTable::from_frame(joined)?, names))
}
