//! Headline numbers for the overview: last week and month to date

use chrono::{Duration, NaiveDate};

use crate::services::normalizer::parse_metric;
use crate::services::source::ReportingSource;
use crate::services::week::month_to_date;
use crate::types::{Period, RawRow, ReportRequest, Result, SummaryStats};

const WEEK_METRICS: [&str; 3] = ["activeUsers", "engagedSessions", "keyEvents"];
const MTD_METRICS: [&str; 2] = ["activeUsers", "engagedSessions"];

/// Fetch both summaries for the week ending `week_end`.
///
/// A response with no rows counts as zeros.
pub fn fetch_summary(
    source: &dyn ReportingSource,
    property_id: &str,
    week_end: NaiveDate,
) -> Result<SummaryStats> {
    let week = Period::new(week_end - Duration::days(6), week_end);
    let week_values = fetch_totals(source, property_id, &week, &WEEK_METRICS)?;
    let mtd_values = fetch_totals(source, property_id, &month_to_date(week_end), &MTD_METRICS)?;

    Ok(SummaryStats {
        week_ending: Some(week_end),
        active_users: week_values[0],
        engaged_sessions: week_values[1],
        key_events: week_values[2],
        mtd_active_users: mtd_values[0],
        mtd_engaged_sessions: mtd_values[1],
    })
}

fn fetch_totals(
    source: &dyn ReportingSource,
    property_id: &str,
    period: &Period,
    metrics: &[&str],
) -> Result<Vec<u64>> {
    let request = ReportRequest {
        property_id: property_id.to_string(),
        dimensions: Vec::new(),
        metrics: metrics.iter().map(|m| m.to_string()).collect(),
        date_range: period.to_date_range(),
        order_bys: Vec::new(),
    };
    let rows = source.fetch_rows(&request)?;
    first_row_totals(rows.first(), metrics.len())
}

/// Metric values of the single total row; missing row or values are zero
fn first_row_totals(row: Option<&RawRow>, count: usize) -> Result<Vec<u64>> {
    (0..count)
        .map(|i| match row.and_then(|r| r.metric(i)) {
            Some(value) => parse_metric(value),
            None => Ok(0),
        })
        .collect()
}
