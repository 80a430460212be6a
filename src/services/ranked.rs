//! Ranked single-period report (landing pages by channel)
//!
//! Items are ranked by their total across segments. The table lists every
//! (item, segment) line of the top items; the chart stacks segments per item.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::services::normalizer::{group_key, parse_metric};
use crate::types::{
    ChartSeries, GroupKey, RankedRow, RawRow, ReportError, ReportOutcome, Result, StackedChart,
};

/// Parameters for a ranked report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedConfig {
    /// Item dimension first, then the segment dimension
    pub key_dimensions: Vec<usize>,
    /// Item values to drop
    #[serde(default)]
    pub excluded: BTreeSet<String>,
    #[serde(default)]
    pub metric_index: usize,
    /// Value column header
    pub value_label: String,
    /// Items shown in the table
    pub table_top_n: usize,
    /// Items shown in the chart
    pub chart_top_n: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedViews {
    pub table: Vec<RankedRow>,
    pub chart: StackedChart,
}

/// Sum per (item, segment), rank items by total, cut table and chart.
///
/// Ties keep item key order. Within an item, lines follow segment key order.
pub fn build(rows: &[RawRow], config: &RankedConfig) -> Result<ReportOutcome<RankedViews>> {
    let mut sums: BTreeMap<GroupKey, u64> = BTreeMap::new();

    for row in rows {
        let key = group_key(row, &config.key_dimensions)?;
        if config.excluded.contains(key.top()) {
            continue;
        }
        let value = row
            .metric(config.metric_index)
            .ok_or_else(|| ReportError::MissingField(format!("metric {}", config.metric_index)))?;
        let value = parse_metric(value)?;

        let cell = sums.entry(key).or_insert(0);
        *cell = cell.saturating_add(value);
    }

    if sums.is_empty() {
        return Ok(ReportOutcome::NoData);
    }

    // BTreeMap keeps each item's lines contiguous and in segment order
    let mut items: Vec<(String, u64, Vec<RankedRow>)> = Vec::new();
    for (key, value) in sums {
        let same_item = items.last().is_some_and(|(top, _, _)| top == key.top());
        match items.last_mut() {
            Some((_, total, lines)) if same_item => {
                *total = total.saturating_add(value);
                lines.push(RankedRow { key, value });
            }
            _ => items.push((key.top().to_string(), value, vec![RankedRow { key, value }])),
        }
    }
    // sort_by is stable
    items.sort_by(|a, b| b.1.cmp(&a.1));

    let chart = stacked_chart(&items[..config.chart_top_n.min(items.len())]);
    let table = items
        .into_iter()
        .take(config.table_top_n)
        .flat_map(|(_, _, lines)| lines)
        .collect();

    Ok(ReportOutcome::Ready(RankedViews { table, chart }))
}

/// One category per item, one series per segment, largest segment first
fn stacked_chart(items: &[(String, u64, Vec<RankedRow>)]) -> StackedChart {
    let mut segments: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
    for (i, (_, _, lines)) in items.iter().enumerate() {
        for line in lines {
            let segment = line.key.fields().get(1).map(String::as_str).unwrap_or("");
            let values = segments.entry(segment).or_insert_with(|| vec![0; items.len()]);
            values[i] = values[i].saturating_add(line.value);
        }
    }

    let mut series: Vec<ChartSeries> = segments
        .into_iter()
        .map(|(name, values)| ChartSeries {
            name: name.to_string(),
            values,
        })
        .collect();
    series.sort_by_key(|s| std::cmp::Reverse(s.values.iter().sum::<u64>()));

    StackedChart {
        categories: items.iter().map(|(top, _, _)| top.clone()).collect(),
        series,
    }
}
