//! Runs one report definition end to end: fetch, reshape, render, write.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::services::catalog::{ReportDefinition, ReportKind};
use crate::services::renderer::{render, write_report};
use crate::services::source::ReportingSource;
use crate::services::summary::fetch_summary;
use crate::services::week::last_saturday;
use crate::services::{performance, pipeline, ranked};
use crate::types::{
    PerformanceModel, RankedModel, ReportDocument, ReportModel, ReportOutcome, Result,
};

pub struct ReportRunner<'a> {
    source: &'a dyn ReportingSource,
    property_id: String,
    today: NaiveDate,
}

impl<'a> ReportRunner<'a> {
    pub fn new(source: &'a dyn ReportingSource, property_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            source,
            property_id: property_id.into(),
            today,
        }
    }

    /// Fetch and reshape without touching the filesystem
    pub fn build(&self, def: &ReportDefinition) -> Result<ReportOutcome<ReportDocument>> {
        let (request, period) = def.request(&self.property_id, self.today);
        let rows = self.source.fetch_rows(&request)?;
        debug!(report = %def.id, source = self.source.name(), rows = rows.len(), "fetched");

        let title = def.title_for(period.as_ref());

        match &def.kind {
            ReportKind::Weekly(config) => {
                let projection = match pipeline::run(&rows, config)? {
                    ReportOutcome::Ready(p) => p,
                    ReportOutcome::NoData => return Ok(ReportOutcome::NoData),
                };

                let summary = if def.include_summary {
                    let week_end = period
                        .as_ref()
                        .map(|p| p.end)
                        .unwrap_or_else(|| last_saturday(self.today));
                    Some(fetch_summary(self.source, &self.property_id, week_end)?)
                } else {
                    None
                };

                Ok(ReportOutcome::Ready(ReportDocument::Weekly(ReportModel {
                    id: def.id.clone(),
                    title,
                    key_labels: def.key_labels.clone(),
                    weeks: projection.weeks,
                    week_labels: projection.week_labels,
                    table_view: projection.table_view,
                    chart_view: projection.chart_view,
                    period,
                    summary,
                })))
            }
            ReportKind::Performance(config) => Ok(performance::build(&rows, config)?.map(|views| {
                ReportDocument::Performance(PerformanceModel {
                    id: def.id.clone(),
                    title,
                    key_labels: def.key_labels.clone(),
                    table: views.table,
                    chart: views.chart,
                    period,
                })
            })),
            ReportKind::Ranked(config) => Ok(ranked::build(&rows, config)?.map(|views| {
                ReportDocument::Ranked(RankedModel {
                    id: def.id.clone(),
                    title,
                    key_labels: def.key_labels.clone(),
                    value_label: config.value_label.clone(),
                    table: views.table,
                    chart: views.chart,
                    period,
                })
            })),
        }
    }

    /// Build, render and write `<output_dir>/<id>.html`
    pub fn generate(&self, def: &ReportDefinition, output_dir: &Path) -> Result<ReportOutcome<PathBuf>> {
        let document = match self.build(def)? {
            ReportOutcome::Ready(doc) => doc,
            ReportOutcome::NoData => {
                info!(report = %def.id, "no data returned, skipping");
                return Ok(ReportOutcome::NoData);
            }
        };

        let path = write_report(output_dir, &def.output_file(), &render(&document))?;
        info!(report = %def.id, path = %path.display(), "report written");
        Ok(ReportOutcome::Ready(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::catalog::find_report;
    use crate::types::{RawRow, ReportError, ReportRequest};
    use tempfile::TempDir;

    /// Serves rows by the request's first dimension; summary requests get one total row
    struct StubSource {
        rows: Vec<RawRow>,
    }

    impl ReportingSource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        fn fetch_rows(&self, request: &ReportRequest) -> Result<Vec<RawRow>> {
            if request.dimensions.is_empty() {
                let values = vec!["7"; request.metrics.len()];
                return Ok(vec![RawRow::new(Vec::<String>::new(), values)]);
            }
            Ok(self.rows.clone())
        }
    }

    struct FailingSource;

    impl ReportingSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn fetch_rows(&self, _request: &ReportRequest) -> Result<Vec<RawRow>> {
            Err(ReportError::UpstreamFetch("HTTP 403 Forbidden".into()))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
    }

    fn report(id: &str) -> ReportDefinition {
        find_report(&Config::default(), id).unwrap()
    }

    // ========== build() tests ==========

    #[test]
    fn test_build_overview_with_summary() {
        let source = StubSource {
            rows: vec![
                RawRow::new(["Direct", "20240108"], ["10"]),
                RawRow::new(["Organic Search", "20240102"], ["4"]),
            ],
        };
        let runner = ReportRunner::new(&source, "123", today());

        let doc = match runner.build(&report("overview")).unwrap() {
            ReportOutcome::Ready(ReportDocument::Weekly(m)) => m,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(doc.week_labels, vec!["Jan 07 - Jan 13", "Dec 31 - Jan 06"]);
        assert!(doc.table_view.rows.last().unwrap().key.is_total());
        let summary = doc.summary.unwrap();
        assert_eq!(summary.active_users, 7);
        assert_eq!(summary.week_ending, NaiveDate::from_ymd_opt(2024, 1, 13));
    }

    #[test]
    fn test_build_performance() {
        let source = StubSource {
            rows: vec![
                RawRow::new(["spring", "google / cpc"], ["200", "10"]),
                RawRow::new(["(direct)", "(none)"], ["900", "1"]),
            ],
        };
        let runner = ReportRunner::new(&source, "123", today());

        let doc = match runner.build(&report("campaign_performance")).unwrap() {
            ReportOutcome::Ready(ReportDocument::Performance(m)) => m,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(doc.table.len(), 1);
        assert_eq!(doc.title, "Top 10 Campaigns Performance for Week Ending January 13, 2024");
    }

    #[test]
    fn test_build_landing_page() {
        // 25 pages, each with a Direct and an Organic Search line
        let rows = (1..=25)
            .flat_map(|i| {
                let page = format!("/p{i:02}");
                [
                    RawRow::new([page.clone(), "Direct".to_string()], [(i * 3).to_string()]),
                    RawRow::new([page, "Organic Search".to_string()], [i.to_string()]),
                ]
            })
            .chain([RawRow::new(["(not set)", "Direct"], ["5000"])])
            .collect();
        let source = StubSource { rows };
        let runner = ReportRunner::new(&source, "123", today());

        let doc = match runner.build(&report("landing_page")).unwrap() {
            ReportOutcome::Ready(ReportDocument::Ranked(m)) => m,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert_eq!(doc.title, "Top Landing Pages by Engaged Sessions for Week Ending January 13, 2024");
        assert_eq!(doc.value_label, "Engaged Sessions");
        assert_eq!(doc.table.len(), 40);
        assert_eq!(doc.table[0].key.fields(), ["/p25", "Direct"]);
        assert_eq!(doc.table[0].value, 75);
        assert!(doc.table.iter().all(|r| !r.key.is_others() && !r.key.is_total()));
        assert!(doc.table.iter().all(|r| r.key.top() != "(not set)"));

        assert_eq!(doc.chart.categories.len(), 15);
        assert_eq!(doc.chart.categories.last().unwrap(), "/p11");
        let names: Vec<&str> = doc.chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Direct", "Organic Search"]);
    }

    #[test]
    fn test_build_empty_rows_is_no_data() {
        let source = StubSource { rows: Vec::new() };
        let runner = ReportRunner::new(&source, "123", today());

        assert!(runner.build(&report("campaign")).unwrap().is_no_data());
        assert!(runner.build(&report("campaign_performance")).unwrap().is_no_data());
        assert!(runner.build(&report("landing_page")).unwrap().is_no_data());
    }

    #[test]
    fn test_build_propagates_fetch_error() {
        let runner = ReportRunner::new(&FailingSource, "123", today());
        let err = runner.build(&report("campaign")).unwrap_err();
        assert!(matches!(err, ReportError::UpstreamFetch(_)));
    }

    // ========== generate() tests ==========

    #[test]
    fn test_generate_writes_html() {
        let temp_dir = TempDir::new().unwrap();
        let source = StubSource {
            rows: vec![RawRow::new(["spring", "google / cpc", "20240108"], ["12"])],
        };
        let runner = ReportRunner::new(&source, "123", today());

        let path = match runner.generate(&report("campaign"), temp_dir.path()).unwrap() {
            ReportOutcome::Ready(p) => p,
            ReportOutcome::NoData => panic!("expected a report"),
        };

        assert_eq!(path, temp_dir.path().join("campaign.html"));
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("Google Analytics Weekly Campaign Report"));
        assert!(html.contains("total-row"));
    }

    #[test]
    fn test_generate_no_data_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let source = StubSource { rows: Vec::new() };
        let runner = ReportRunner::new(&source, "123", today());

        let outcome = runner.generate(&report("campaign"), temp_dir.path()).unwrap();

        assert!(outcome.is_no_data());
        assert!(!temp_dir.path().join("campaign.html").exists());
    }
}
