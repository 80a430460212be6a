//! Built-in report definitions
//!
//! Each report is a request layout plus a pipeline configuration.

use chrono::NaiveDate;

use crate::config::Config;
use crate::services::normalizer::RowLayout;
use crate::services::performance::PerformanceConfig;
use crate::services::pipeline::PipelineConfig;
use crate::services::ranked::RankedConfig;
use crate::services::week::weeks_ending_last_saturday;
use crate::types::{DateRange, OrderBy, Period, ReportRequest};

const ENGAGED_SESSIONS: &str = "engagedSessions";
const KEY_EVENTS: &str = "keyEvents";

/// Campaign values that are not real campaigns
pub const EXCLUDED_CAMPAIGNS: [&str; 4] = ["(direct)", "(organic)", "(referral)", "(not set)"];

/// Placeholder replaced with the period's last day in titles
pub const WEEK_ENDING_PLACEHOLDER: &str = "{week_ending}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSpec {
    /// Passed to the API as-is, e.g. `42daysAgo` .. `yesterday`
    Relative(DateRange),
    /// Whole weeks ending on the last completed Saturday
    WeeksEndingLastSaturday(u32),
}

impl DateSpec {
    /// API date range, plus the concrete period when one is known
    pub fn resolve(&self, today: NaiveDate) -> (DateRange, Option<Period>) {
        match self {
            DateSpec::Relative(range) => (range.clone(), None),
            DateSpec::WeeksEndingLastSaturday(weeks) => {
                let period = weeks_ending_last_saturday(today, *weeks);
                (period.to_date_range(), Some(period))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportKind {
    Weekly(PipelineConfig),
    Performance(PerformanceConfig),
    Ranked(RankedConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDefinition {
    pub id: String,
    /// May contain `{week_ending}`
    pub title: String,
    /// Table header for each group key field
    pub key_labels: Vec<String>,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub order_bys: Vec<OrderBy>,
    pub dates: DateSpec,
    pub kind: ReportKind,
    /// Fetch last-week and month-to-date headline numbers
    pub include_summary: bool,
}

impl ReportDefinition {
    pub fn request(&self, property_id: &str, today: NaiveDate) -> (ReportRequest, Option<Period>) {
        let (date_range, period) = self.dates.resolve(today);
        let request = ReportRequest {
            property_id: property_id.to_string(),
            dimensions: self.dimensions.clone(),
            metrics: self.metrics.clone(),
            date_range,
            order_bys: self.order_bys.clone(),
        };
        (request, period)
    }

    pub fn title_for(&self, period: Option<&Period>) -> String {
        match period {
            Some(p) => self
                .title
                .replace(WEEK_ENDING_PLACEHOLDER, &p.end.format("%B %d, %Y").to_string()),
            None => self.title.replace(WEEK_ENDING_PLACEHOLDER, "").trim().to_string(),
        }
    }

    pub fn output_file(&self) -> String {
        format!("{}.html", self.id)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// All reports, in the order `gareport all` runs and prints them
pub fn builtin_reports(config: &Config) -> Vec<ReportDefinition> {
    let channel = config.channel_dimension.as_str();

    vec![
        ReportDefinition {
            id: "overview".into(),
            title: "Weekly Engaged Sessions by Channel (Last 6 Weeks)".into(),
            key_labels: strings(&["Channel"]),
            dimensions: strings(&[channel, "date"]),
            metrics: strings(&[ENGAGED_SESSIONS]),
            order_bys: vec![
                OrderBy::dimension_desc("date"),
                OrderBy::metric_desc(ENGAGED_SESSIONS),
            ],
            dates: DateSpec::WeeksEndingLastSaturday(6),
            kind: ReportKind::Weekly(PipelineConfig::new(RowLayout::new(vec![0], 1))),
            include_summary: true,
        },
        ReportDefinition {
            id: "campaign".into(),
            title: "Google Analytics Weekly Campaign Report".into(),
            key_labels: strings(&["Campaign", "Source / Medium"]),
            dimensions: strings(&["sessionCampaignName", "sessionSourceMedium", "date"]),
            metrics: strings(&[ENGAGED_SESSIONS]),
            order_bys: vec![
                OrderBy::dimension_desc("date"),
                OrderBy::metric_desc(ENGAGED_SESSIONS),
            ],
            dates: DateSpec::Relative(DateRange::new("42daysAgo", "yesterday")),
            kind: ReportKind::Weekly(
                PipelineConfig::new(RowLayout::new(vec![0, 1], 2).excluding(EXCLUDED_CAMPAIGNS))
                    .with_top_n(20),
            ),
            include_summary: false,
        },
        ReportDefinition {
            id: "campaign_performance".into(),
            title: "Top 10 Campaigns Performance for Week Ending {week_ending}".into(),
            key_labels: strings(&["Campaign", "Source / Medium"]),
            dimensions: strings(&["sessionCampaignName", "sessionSourceMedium"]),
            metrics: strings(&[ENGAGED_SESSIONS, KEY_EVENTS]),
            order_bys: vec![OrderBy::metric_desc(ENGAGED_SESSIONS)],
            dates: DateSpec::WeeksEndingLastSaturday(1),
            kind: ReportKind::Performance(PerformanceConfig {
                key_dimensions: vec![0, 1],
                excluded: EXCLUDED_CAMPAIGNS.iter().map(|s| s.to_string()).collect(),
                sessions_metric: 0,
                key_events_metric: 1,
                table_top_n: 20,
                chart_top_n: 10,
            }),
            include_summary: false,
        },
        ReportDefinition {
            id: "landing_page".into(),
            title: "Top Landing Pages by Engaged Sessions for Week Ending {week_ending}".into(),
            key_labels: strings(&["Landing Page", "Channel"]),
            dimensions: strings(&["landingPage", channel]),
            metrics: strings(&[ENGAGED_SESSIONS]),
            order_bys: vec![OrderBy::metric_desc(ENGAGED_SESSIONS)],
            dates: DateSpec::WeeksEndingLastSaturday(1),
            kind: ReportKind::Ranked(RankedConfig {
                key_dimensions: vec![0, 1],
                excluded: ["(not set)".to_string()].into_iter().collect(),
                metric_index: 0,
                value_label: "Engaged Sessions".into(),
                table_top_n: 20,
                chart_top_n: 15,
            }),
            include_summary: false,
        },
    ]
}

/// Look up a built-in report by id
pub fn find_report(config: &Config, id: &str) -> Option<ReportDefinition> {
    builtin_reports(config).into_iter().find(|r| r.id == id)
}
