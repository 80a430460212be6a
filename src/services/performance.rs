//! Campaign performance: single-period sessions, key events and key event rate

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::services::normalizer::{group_key, parse_metric};
use crate::types::{PerformanceRow, RawRow, ReportError, ReportOutcome, Result};

/// Parameters for a performance report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    pub key_dimensions: Vec<usize>,
    #[serde(default)]
    pub excluded: BTreeSet<String>,
    pub sessions_metric: usize,
    pub key_events_metric: usize,
    pub table_top_n: usize,
    pub chart_top_n: usize,
}

/// Performance rows for the table and the (shorter) chart
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceViews {
    pub table: Vec<PerformanceRow>,
    pub chart: Vec<PerformanceRow>,
}

/// Sum both metrics per key, derive the rate, sort by sessions descending.
pub fn build(rows: &[RawRow], config: &PerformanceConfig) -> Result<ReportOutcome<PerformanceViews>> {
    let mut sums: BTreeMap<_, (u64, u64)> = BTreeMap::new();

    for row in rows {
        let key = group_key(row, &config.key_dimensions)?;
        if config.excluded.contains(key.top()) {
            continue;
        }
        let sessions = parse_metric(metric(row, config.sessions_metric)?)?;
        let key_events = parse_metric(metric(row, config.key_events_metric)?)?;

        let entry = sums.entry(key).or_default();
        entry.0 = entry.0.saturating_add(sessions);
        entry.1 = entry.1.saturating_add(key_events);
    }

    if sums.is_empty() {
        return Ok(ReportOutcome::NoData);
    }

    let mut ranked: Vec<PerformanceRow> = sums
        .into_iter()
        .map(|(key, (engaged_sessions, key_events))| PerformanceRow {
            key,
            engaged_sessions,
            key_events,
            key_event_rate: key_event_rate(key_events, engaged_sessions),
        })
        .collect();
    ranked.sort_by(|a, b| b.engaged_sessions.cmp(&a.engaged_sessions));

    let chart = ranked.iter().take(config.chart_top_n).cloned().collect();
    ranked.truncate(config.table_top_n);

    Ok(ReportOutcome::Ready(PerformanceViews {
        table: ranked,
        chart,
    }))
}

fn metric(row: &RawRow, index: usize) -> Result<&str> {
    row.metric(index)
        .ok_or_else(|| ReportError::MissingField(format!("metric {}", index)))
}

/// Key events per engaged session; 0.0 without sessions
pub fn key_event_rate(key_events: u64, engaged_sessions: u64) -> f64 {
    if engaged_sessions == 0 {
        0.0
    } else {
        key_events as f64 / engaged_sessions as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PerformanceConfig {
        PerformanceConfig {
            key_dimensions: vec![0, 1],
            excluded: ["(direct)", "(not set)"].into_iter().map(String::from).collect(),
            sessions_metric: 0,
            key_events_metric: 1,
            table_top_n: 3,
            chart_top_n: 2,
        }
    }

    fn ready(outcome: ReportOutcome<PerformanceViews>) -> PerformanceViews {
        match outcome {
            ReportOutcome::Ready(v) => v,
            ReportOutcome::NoData => panic!("expected data"),
        }
    }

    #[test]
    fn test_empty_is_no_data() {
        assert!(build(&[], &config()).unwrap().is_no_data());
    }

    #[test]
    fn test_sorted_and_truncated() {
        let rows = vec![
            RawRow::new(["a", "google / cpc"], ["10", "1"]),
            RawRow::new(["b", "google / cpc"], ["40", "4"]),
            RawRow::new(["c", "google / cpc"], ["30", "0"]),
            RawRow::new(["d", "google / cpc"], ["20", "5"]),
            RawRow::new(["(direct)", "(none)"], ["999", "9"]),
        ];

        let views = ready(build(&rows, &config()).unwrap());

        let table: Vec<&str> = views.table.iter().map(|r| r.key.top()).collect();
        assert_eq!(table, vec!["b", "c", "d"]);
        let chart: Vec<&str> = views.chart.iter().map(|r| r.key.top()).collect();
        assert_eq!(chart, vec!["b", "c"]);
        assert!((views.table[0].key_event_rate - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_keys_summed() {
        let rows = vec![
            RawRow::new(["a", "x"], ["10", "1"]),
            RawRow::new(["a", "x"], ["5", "2"]),
        ];

        let views = ready(build(&rows, &config()).unwrap());

        assert_eq!(views.table.len(), 1);
        assert_eq!(views.table[0].engaged_sessions, 15);
        assert_eq!(views.table[0].key_events, 3);
    }

    #[test]
    fn test_missing_metric_is_fatal() {
        let rows = vec![RawRow::new(["a", "x"], ["10"])];
        let err = build(&rows, &config()).unwrap_err();
        assert!(matches!(err, ReportError::MissingField(_)));
    }

    #[test]
    fn test_key_event_rate_zero_sessions() {
        assert_eq!(key_event_rate(3, 0), 0.0);
        assert!((key_event_rate(1, 4) - 0.25).abs() < f64::EPSILON);
    }
}
