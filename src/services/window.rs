//! Window selection: restrict a sparse weekly table to its most recent weeks

use crate::types::{MetricTable, ReportError, Result, TableRow, WeekKey, WeeklyTable};

/// Number of week columns a report shows by default
pub const DEFAULT_WINDOW: usize = 6;

/// Keep the `window` most recent weeks present in `table`, most recent first,
/// zero-filling cells a group has no data for.
///
/// Weeks are only ever taken from the table itself. With fewer than `window`
/// distinct weeks, all of them are used.
pub fn select_window(table: &MetricTable, window: usize) -> Result<WeeklyTable> {
    if window == 0 {
        return Err(ReportError::Config("window must be at least one week".into()));
    }
    if table.is_empty() {
        return Err(ReportError::NoData);
    }

    let weeks: Vec<WeekKey> = table.weeks().into_iter().rev().take(window).collect();

    let rows = table
        .groups()
        .map(|key| TableRow {
            key: key.clone(),
            values: weeks.iter().map(|&w| table.get(key, w)).collect(),
        })
        .collect();

    Ok(WeeklyTable { weeks, rows })
}
