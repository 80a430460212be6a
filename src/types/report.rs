//! Table and report model types

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::Period;

/// Top-level label of the synthetic row that absorbs groups past the top-N cutoff
pub const OTHERS_LABEL: &str = "Others";

/// Top-level label of the synthetic grand-total row
pub const TOTAL_LABEL: &str = "Total";

/// One result row from the reporting API: dimension values and metric values,
/// both still in their wire (string) form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawRow {
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
}

impl RawRow {
    pub fn new<D, M>(dimensions: D, metrics: M) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            metrics: metrics.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dimension(&self, index: usize) -> Option<&str> {
        self.dimensions.get(index).map(String::as_str)
    }

    pub fn metric(&self, index: usize) -> Option<&str> {
        self.metrics.get(index).map(String::as_str)
    }
}

/// Identifies a reporting entity (campaign, campaign + source/medium, ...).
///
/// The first field is the top-level key: exclusion, ranking and the chart
/// projection all look at it alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey {
    fields: Vec<String>,
    /// Set only on the rows the collapser and projector add
    #[serde(skip_serializing_if = "Option::is_none")]
    synthetic: Option<SyntheticRow>,
}

/// Rows that do not come from upstream data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticRow {
    Others,
    Total,
}

impl SyntheticRow {
    pub fn label(self) -> &'static str {
        match self {
            SyntheticRow::Others => OTHERS_LABEL,
            SyntheticRow::Total => TOTAL_LABEL,
        }
    }
}

impl GroupKey {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            synthetic: None,
        }
    }

    pub fn single(field: impl Into<String>) -> Self {
        Self::new(vec![field.into()])
    }

    /// Synthetic key such as `("Others", "")`: label first, empty strings for
    /// the remaining `arity - 1` fields. Never equal to a real group with the
    /// same text.
    pub fn synthetic(kind: SyntheticRow, arity: usize) -> Self {
        let mut fields = Vec::with_capacity(arity.max(1));
        fields.push(kind.label().to_string());
        fields.resize(arity.max(1), String::new());
        Self {
            fields,
            synthetic: Some(kind),
        }
    }

    pub fn others(arity: usize) -> Self {
        Self::synthetic(SyntheticRow::Others, arity)
    }

    pub fn total(arity: usize) -> Self {
        Self::synthetic(SyntheticRow::Total, arity)
    }

    /// Single-field key holding only the top-level value; keeps the marker
    pub fn top_level(&self) -> Self {
        Self {
            fields: vec![self.top().to_string()],
            synthetic: self.synthetic,
        }
    }

    pub fn top(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or("")
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    pub fn synthetic_kind(&self) -> Option<SyntheticRow> {
        self.synthetic
    }

    pub fn is_others(&self) -> bool {
        self.synthetic == Some(SyntheticRow::Others)
    }

    pub fn is_total(&self) -> bool {
        self.synthetic == Some(SyntheticRow::Total)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .fields
            .iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        write!(f, "{}", parts.join(" / "))
    }
}

/// The Sunday that starts a 7-day (Sunday - Saturday) reporting week.
///
/// Only constructed through `services::week::bucket`, so the inner date is
/// always a Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekKey(NaiveDate);

impl WeekKey {
    pub(crate) fn from_sunday(start: NaiveDate) -> Self {
        debug_assert_eq!(start.weekday(), Weekday::Sun);
        Self(start)
    }

    pub fn start(&self) -> NaiveDate {
        self.0
    }

    /// Saturday closing the week
    pub fn end(&self) -> NaiveDate {
        self.0 + Duration::days(6)
    }

    /// Column header, e.g. "Dec 31 - Jan 06"
    pub fn label(&self) -> String {
        format!("{} - {}", self.start().format("%b %d"), self.end().format("%b %d"))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sparse group x week table of accumulated metric values.
/// Absent cells are zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricTable {
    cells: BTreeMap<GroupKey, BTreeMap<WeekKey, u64>>,
}

impl MetricTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert: missing cells start at zero. Saturates instead of overflowing.
    pub fn add(&mut self, key: GroupKey, week: WeekKey, value: u64) {
        let cell = self.cells.entry(key).or_default().entry(week).or_insert(0);
        *cell = cell.saturating_add(value);
    }

    pub fn get(&self, key: &GroupKey, week: WeekKey) -> u64 {
        self.cells
            .get(key)
            .and_then(|row| row.get(&week))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn group_count(&self) -> usize {
        self.cells.len()
    }

    /// Groups in key order
    pub fn groups(&self) -> impl Iterator<Item = &GroupKey> {
        self.cells.keys()
    }

    /// Every week that has at least one cell, ascending
    pub fn weeks(&self) -> BTreeSet<WeekKey> {
        self.cells
            .values()
            .flat_map(|row| row.keys().copied())
            .collect()
    }
}

/// One row of a dense table: values line up with `WeeklyTable::weeks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub key: GroupKey,
    pub values: Vec<u64>,
}

/// Dense table with fixed week columns, most recent first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct WeeklyTable {
    pub weeks: Vec<WeekKey>,
    pub rows: Vec<TableRow>,
}

impl WeeklyTable {
    /// Column-wise sum over every row
    pub fn column_sums(&self) -> Vec<u64> {
        let mut sums = vec![0u64; self.weeks.len()];
        for row in &self.rows {
            for (sum, value) in sums.iter_mut().zip(&row.values) {
                *sum = sum.saturating_add(*value);
            }
        }
        sums
    }

    pub fn find(&self, key: &GroupKey) -> Option<&TableRow> {
        self.rows.iter().find(|r| &r.key == key)
    }

    /// Key arity shared by the rows (1 for an empty table)
    pub fn arity(&self) -> usize {
        self.rows.first().map(|r| r.key.arity()).unwrap_or(1)
    }

    pub fn week_labels(&self) -> Vec<String> {
        self.weeks.iter().map(WeekKey::label).collect()
    }
}

/// Last-week and month-to-date headline numbers for the overview report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct SummaryStats {
    pub week_ending: Option<NaiveDate>,
    pub active_users: u64,
    pub engaged_sessions: u64,
    pub key_events: u64,
    pub mtd_active_users: u64,
    pub mtd_engaged_sessions: u64,
}

/// Output of a weekly pipeline run, handed read-only to rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportModel {
    pub id: String,
    pub title: String,
    /// Header for each group key field, top-level first
    pub key_labels: Vec<String>,
    pub weeks: Vec<WeekKey>,
    pub week_labels: Vec<String>,
    /// Collapsed table plus a trailing Total row
    pub table_view: WeeklyTable,
    /// One row per top-level group, no Total row
    pub chart_view: WeeklyTable,
    pub period: Option<Period>,
    pub summary: Option<SummaryStats>,
}

/// One (campaign, source/medium) line of the performance report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRow {
    pub key: GroupKey,
    pub engaged_sessions: u64,
    pub key_events: u64,
    /// key_events / engaged_sessions, 0.0 when there were no sessions
    pub key_event_rate: f64,
}

/// Single-period campaign performance: two metrics and a derived rate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceModel {
    pub id: String,
    pub title: String,
    pub key_labels: Vec<String>,
    pub table: Vec<PerformanceRow>,
    pub chart: Vec<PerformanceRow>,
    pub period: Option<Period>,
}

/// One (item, segment) line of a ranked single-period report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRow {
    pub key: GroupKey,
    pub value: u64,
}

/// One stack segment across every chart category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<u64>,
}

/// Categories along the x axis; each series is one colored segment of every bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct StackedChart {
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl StackedChart {
    /// Stacked height of each category
    pub fn category_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.categories.len()];
        for series in &self.series {
            for (total, value) in totals.iter_mut().zip(&series.values) {
                *total = total.saturating_add(*value);
            }
        }
        totals
    }
}

/// Single-period ranking (landing pages): items ordered by their total,
/// split by a second-level segment. No Others or Total row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedModel {
    pub id: String,
    pub title: String,
    pub key_labels: Vec<String>,
    /// Header of the value column, e.g. "Engaged Sessions"
    pub value_label: String,
    pub table: Vec<RankedRow>,
    pub chart: StackedChart,
    pub period: Option<Period>,
}

/// Anything the renderer can turn into an HTML page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportDocument {
    Weekly(ReportModel),
    Performance(PerformanceModel),
    Ranked(RankedModel),
}

impl ReportDocument {
    pub fn id(&self) -> &str {
        match self {
            ReportDocument::Weekly(m) => &m.id,
            ReportDocument::Performance(m) => &m.id,
            ReportDocument::Ranked(m) => &m.id,
        }
    }
}

/// Either a finished model or the "no data" signal. Empty upstream results
/// are not errors; callers skip rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome<T> {
    Ready(T),
    NoData,
}

impl<T> ReportOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReportOutcome<U> {
        match self {
            ReportOutcome::Ready(v) => ReportOutcome::Ready(f(v)),
            ReportOutcome::NoData => ReportOutcome::NoData,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, ReportOutcome::NoData)
    }
}
