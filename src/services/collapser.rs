//! Top-N collapsing
//!
//! Ranks top-level groups by one week column, keeps the best N and folds the
//! rest into a single `Others` row that always sorts last.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{GroupKey, ReportError, Result, TableRow, WeeklyTable};

/// Week column used for ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnchorColumn {
    /// First column of a descending window
    #[default]
    MostRecent,
    /// Explicit column position, 0 = most recent
    Index(usize),
}

impl AnchorColumn {
    fn resolve(self, table: &WeeklyTable) -> Result<usize> {
        let index = match self {
            AnchorColumn::MostRecent => 0,
            AnchorColumn::Index(i) => i,
        };
        if index >= table.weeks.len() {
            return Err(ReportError::Config(format!(
                "anchor column {} out of range ({} weeks)",
                index,
                table.weeks.len()
            )));
        }
        Ok(index)
    }
}

/// Top-level groups with their summed anchor value, highest first.
///
/// Ties keep the order in which groups first appear in `table`.
pub fn rank_top_level(table: &WeeklyTable, anchor: usize) -> Vec<(String, u64)> {
    let mut ranked: Vec<(String, u64)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for row in &table.rows {
        let value = row.values.get(anchor).copied().unwrap_or(0);
        match positions.get(row.key.top()) {
            Some(&pos) => ranked[pos].1 = ranked[pos].1.saturating_add(value),
            None => {
                positions.insert(row.key.top(), ranked.len());
                ranked.push((row.key.top().to_string(), value));
            }
        }
    }

    // sort_by is stable
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Rank and collapse a windowed table.
///
/// With `top_n = None`, or no more top-level groups than `top_n`, rows are
/// only re-ordered. Otherwise rows outside the top N groups are summed
/// column-wise into `("Others", "")`, appended after every kept group.
pub fn collapse(table: WeeklyTable, anchor: AnchorColumn, top_n: Option<usize>) -> Result<WeeklyTable> {
    if table.rows.is_empty() {
        return Ok(table);
    }
    let anchor = anchor.resolve(&table)?;
    let ranked = rank_top_level(&table, anchor);

    let keep = match top_n {
        Some(n) if ranked.len() > n => n,
        _ => ranked.len(),
    };
    let collapsing = keep < ranked.len();
    let arity = table.arity();

    let rank_of: HashMap<&str, usize> = ranked
        .iter()
        .take(keep)
        .enumerate()
        .map(|(i, (top, _))| (top.as_str(), i))
        .collect();

    let mut buckets: Vec<Vec<TableRow>> = vec![Vec::new(); keep];
    let mut others = vec![0u64; table.weeks.len()];

    let WeeklyTable { weeks, rows } = table;
    for row in rows {
        match rank_of.get(row.key.top()) {
            Some(&rank) => buckets[rank].push(row),
            None => {
                for (sum, value) in others.iter_mut().zip(&row.values) {
                    *sum = sum.saturating_add(*value);
                }
            }
        }
    }

    let mut rows: Vec<TableRow> = buckets.into_iter().flatten().collect();
    if collapsing {
        rows.push(TableRow {
            key: GroupKey::others(arity),
            values: others,
        });
    }

    Ok(WeeklyTable { weeks, rows })
}
