//! Aggregator service for building weekly metric tables

use crate::services::normalizer::{normalize_row, NormalizedRow, RowLayout};
use crate::services::week::bucket;
use crate::types::{MetricTable, RawRow, Result};

/// Aggregator for summing metric values per (group, week)
pub struct Aggregator;

impl Aggregator {
    /// Sum normalized rows into a weekly table. Empty input gives an empty table.
    pub fn weekly<I>(rows: I) -> MetricTable
    where
        I: IntoIterator<Item = NormalizedRow>,
    {
        let mut table = MetricTable::new();
        for row in rows {
            table.add(row.key, bucket(row.date), row.value);
        }
        table
    }

    /// Normalize raw rows, then sum the kept ones with `weekly`.
    ///
    /// Fails on the first malformed row; no partial table is returned.
    pub fn weekly_from_raw(rows: &[RawRow], layout: &RowLayout) -> Result<MetricTable> {
        let normalized = rows
            .iter()
            .map(|raw| normalize_row(raw, layout))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::weekly(normalized.into_iter().flatten()))
    }
}
