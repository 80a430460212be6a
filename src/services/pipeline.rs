//! Weekly reshaping pipeline
//!
//! normalize → bucket → aggregate → select window → collapse → project.
//! One configuration per report replaces per-report copies of this flow.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::collapser::{collapse, AnchorColumn};
use crate::services::normalizer::RowLayout;
use crate::services::projector::{chart_view, table_view};
use crate::services::window::{select_window, DEFAULT_WINDOW};
use crate::services::Aggregator;
use crate::types::{RawRow, ReportError, ReportOutcome, Result, WeekKey, WeeklyTable};

fn default_window() -> usize {
    DEFAULT_WINDOW
}

/// Parameters for one weekly report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub layout: RowLayout,
    #[serde(default = "default_window")]
    pub window: usize,
    /// `None` keeps every group (ranking only)
    #[serde(default)]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub anchor: AnchorColumn,
}

impl PipelineConfig {
    pub fn new(layout: RowLayout) -> Self {
        Self {
            layout,
            window: DEFAULT_WINDOW,
            top_n: None,
            anchor: AnchorColumn::MostRecent,
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = Some(top_n);
        self
    }
}

/// The two views a renderer needs, plus their shared week columns
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub weeks: Vec<WeekKey>,
    pub week_labels: Vec<String>,
    pub table_view: WeeklyTable,
    pub chart_view: WeeklyTable,
}

/// Run the whole pipeline over one fetched row set.
///
/// An empty (or fully excluded) row set comes back as `ReportOutcome::NoData`.
/// Malformed rows abort the run.
pub fn run(rows: &[RawRow], config: &PipelineConfig) -> Result<ReportOutcome<Projection>> {
    let table = Aggregator::weekly_from_raw(rows, &config.layout)?;
    debug!(
        rows = rows.len(),
        groups = table.group_count(),
        "aggregated weekly table"
    );

    let windowed = match select_window(&table, config.window) {
        Ok(t) => t,
        Err(ReportError::NoData) => return Ok(ReportOutcome::NoData),
        Err(e) => return Err(e),
    };

    let collapsed = collapse(windowed, config.anchor, config.top_n)?;
    debug!(
        weeks = collapsed.weeks.len(),
        rows = collapsed.rows.len(),
        "collapsed table"
    );

    Ok(ReportOutcome::Ready(Projection {
        week_labels: collapsed.week_labels(),
        table_view: table_view(&collapsed),
        chart_view: chart_view(&collapsed),
        weeks: collapsed.weeks,
    }))
}
