//! HTML report rendering
//!
//! Produces one self-contained page per report: title, optional period
//! subtitle, an inline SVG chart, the table and (overview only) the summary
//! block. Styling comes from a `styles.css` next to the page.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use num_format::{Locale, ToFormattedString};

use crate::types::{
    ChartSeries, PerformanceModel, PerformanceRow, RankedModel, ReportDocument, ReportModel,
    Result, StackedChart, SummaryStats, WeeklyTable,
};

const CHART_WIDTH: f64 = 1080.0;
const CHART_HEIGHT: f64 = 600.0;
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 80.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 150.0;
const Y_TICKS: u32 = 5;
const LEGEND_COLUMNS: usize = 4;

/// Key cells longer than this are cut and suffixed with "..."
const MAX_LABEL_CHARS: usize = 50;

/// Fixed colors for well-known channel groups
const CHANNEL_COLORS: [(&str, &str); 5] = [
    ("Direct", "#004b57"),
    ("Organic Search", "#00a0b2"),
    ("Paid Social", "#abb222"),
    ("Paid Search", "#FF736E"),
    ("Organic Social", "#317a1c"),
];

const PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

const KEY_EVENTS_LINE_COLOR: &str = "#d62728";

const DEFAULT_CSS: &str = r#"body { font-family: Helvetica, Arial, sans-serif; margin: 24px; color: #222; }
h1 { color: #004b57; }
.chart { margin: 16px 0; }
.styled-table { border-collapse: collapse; font-size: 0.9em; min-width: 600px; }
.styled-table thead tr { background-color: #004b57; color: #fff; text-align: left; }
.styled-table th, .styled-table td { padding: 8px 12px; border-bottom: 1px solid #ddd; }
.styled-table td { text-align: right; }
.styled-table tbody tr:nth-of-type(even) { background-color: #f5f5f5; }
.styled-table tr.total-row { font-weight: bold; border-top: 2px solid #004b57; }
.summary-stats { margin-top: 24px; }
"#;

/// Render any report document to a full HTML page
pub fn render(document: &ReportDocument) -> String {
    match document {
        ReportDocument::Weekly(model) => render_weekly(model),
        ReportDocument::Performance(model) => render_performance(model),
        ReportDocument::Ranked(model) => render_ranked(model),
    }
}

pub fn render_weekly(model: &ReportModel) -> String {
    let mut body = String::new();
    if let Some(period) = &model.period {
        let _ = writeln!(body, "    <h2>{}</h2>", escape(&period.header()));
    }
    let chart = weekly_chart(&model.chart_view, &model.week_labels);
    body.push_str(&stacked_bar_chart(&chart, "Weekly engaged sessions", "Engaged Sessions"));
    body.push_str(&weekly_table(model));
    if let Some(summary) = &model.summary {
        body.push_str(&summary_block(summary));
    }
    page(&model.title, &body)
}

pub fn render_performance(model: &PerformanceModel) -> String {
    let mut body = String::new();
    if let Some(period) = &model.period {
        let _ = writeln!(body, "    <h2>{}</h2>", escape(&period.header()));
    }
    body.push_str(&performance_chart(&model.chart));
    body.push_str(&performance_table(model));
    page(&model.title, &body)
}

pub fn render_ranked(model: &RankedModel) -> String {
    let mut body = String::new();
    if let Some(period) = &model.period {
        let _ = writeln!(body, "    <h2>{}</h2>", escape(&period.header()));
    }
    body.push_str(&stacked_bar_chart(&model.chart, &model.title, &model.value_label));
    body.push_str(&ranked_table(model));
    page(&model.title, &body)
}

/// Write `html` to `<output_dir>/<file_name>`, creating the directory and a
/// default stylesheet when missing.
pub fn write_report(output_dir: &Path, file_name: &str, html: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let css_path = output_dir.join("styles.css");
    if !css_path.exists() {
        fs::write(&css_path, DEFAULT_CSS)?;
    }
    let path = output_dir.join(file_name);
    fs::write(&path, html)?;
    Ok(path)
}

fn page(title: &str, body: &str) -> String {
    let title = escape(title);
    format!(
        r#"<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <link rel="stylesheet" href="styles.css">
</head>
<body>
    <h1>{title}</h1>
{body}</body>
</html>
"#
    )
}

// ========== tables ==========

fn weekly_table(model: &ReportModel) -> String {
    let table = &model.table_view;
    let mut html = String::from("    <table class=\"styled-table\">\n      <thead>\n        <tr>");
    for label in &model.key_labels {
        let _ = write!(html, "<th>{}</th>", escape(label));
    }
    for label in &model.week_labels {
        let _ = write!(html, "<th>{}</th>", escape(label));
    }
    html.push_str("</tr>\n      </thead>\n      <tbody>\n");

    for row in &table.rows {
        if row.key.is_total() {
            html.push_str("        <tr class=\"total-row\">");
        } else {
            html.push_str("        <tr>");
        }
        for field in row.key.fields() {
            html.push_str(&key_cell(field));
        }
        for value in &row.values {
            let _ = write!(html, "<td>{}</td>", format_count(*value));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("      </tbody>\n    </table>\n");
    html
}

fn performance_table(model: &PerformanceModel) -> String {
    let mut html = String::from("    <table class=\"styled-table\">\n      <thead>\n        <tr>");
    for label in &model.key_labels {
        let _ = write!(html, "<th>{}</th>", escape(label));
    }
    html.push_str("<th>Engaged Sessions</th><th>Key Events</th><th>Key Event Rate</th></tr>\n");
    html.push_str("      </thead>\n      <tbody>\n");

    for row in &model.table {
        html.push_str("        <tr>");
        for field in row.key.fields() {
            html.push_str(&key_cell(field));
        }
        let _ = writeln!(
            html,
            "<td>{}</td><td>{}</td><td>{}</td></tr>",
            format_count(row.engaged_sessions),
            format_count(row.key_events),
            format_rate(row.key_event_rate)
        );
    }

    html.push_str("      </tbody>\n    </table>\n");
    html
}

fn ranked_table(model: &RankedModel) -> String {
    let mut html = String::from("    <table class=\"styled-table\">\n      <thead>\n        <tr>");
    for label in &model.key_labels {
        let _ = write!(html, "<th>{}</th>", escape(label));
    }
    let _ = writeln!(html, "<th>{}</th></tr>", escape(&model.value_label));
    html.push_str("      </thead>\n      <tbody>\n");

    for row in &model.table {
        html.push_str("        <tr>");
        for field in row.key.fields() {
            html.push_str(&key_cell(field));
        }
        let _ = writeln!(html, "<td>{}</td></tr>", format_count(row.value));
    }

    html.push_str("      </tbody>\n    </table>\n");
    html
}

fn key_cell(field: &str) -> String {
    let shown = truncate_label(field, MAX_LABEL_CHARS);
    if shown == field {
        format!("<th>{}</th>", escape(field))
    } else {
        format!("<th title=\"{}\">{}</th>", escape(field), escape(&shown))
    }
}

fn summary_block(stats: &SummaryStats) -> String {
    let week_header = match stats.week_ending {
        Some(end) => format!("Summary for week ending {}", end.format("%B %d, %Y")),
        None => "Summary for last week".to_string(),
    };
    let mtd_header = match stats.week_ending {
        Some(end) => format!("Month-to-Date Summary ({})", end.format("%B %Y")),
        None => "Month-to-Date Summary".to_string(),
    };

    format!(
        r#"    <div class="summary-stats">
        <h3>{week_header}</h3>
        <p>Total active users: {}</p>
        <p>Total engaged sessions: {}</p>
        <p>Total key events: {}</p>

        <h3 style="margin-top: 20px;">{mtd_header}</h3>
        <p>MTD Active Users: {}</p>
        <p>MTD Engaged Sessions: {}</p>
    </div>
"#,
        format_count(stats.active_users),
        format_count(stats.engaged_sessions),
        format_count(stats.key_events),
        format_count(stats.mtd_active_users),
        format_count(stats.mtd_engaged_sessions),
    )
}

// ========== charts ==========

/// Plot geometry shared by both chart kinds
struct Plot {
    width: f64,
    height: f64,
    bottom: f64,
}

impl Plot {
    fn new() -> Self {
        Self {
            width: CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT,
            height: CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM,
            bottom: CHART_HEIGHT - MARGIN_BOTTOM,
        }
    }

    fn slot(&self, count: usize) -> f64 {
        self.width / count.max(1) as f64
    }

    fn scale(&self, value: u64, max: u64) -> f64 {
        value as f64 / max.max(1) as f64 * self.height
    }
}

fn svg_open(label: &str) -> String {
    format!(
        "    <div class=\"chart\">\n    <svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{CHART_WIDTH}\" height=\"{CHART_HEIGHT}\" role=\"img\" aria-label=\"{}\">\n",
        escape(label)
    )
}

const SVG_CLOSE: &str = "    </svg>\n    </div>\n";

/// Horizontal gridlines with tick labels on the left (or right) axis
fn y_axis(svg: &mut String, plot: &Plot, max: u64, right: bool) {
    let x = if right {
        MARGIN_LEFT + plot.width + 8.0
    } else {
        MARGIN_LEFT - 8.0
    };
    let anchor = if right { "start" } else { "end" };
    for i in 0..=Y_TICKS {
        let value = max.max(1) * u64::from(i) / u64::from(Y_TICKS);
        let y = plot.bottom - plot.scale(value, max);
        if !right {
            let _ = writeln!(
                svg,
                "      <line x1=\"{MARGIN_LEFT}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"#e5e5e5\"/>",
                MARGIN_LEFT + plot.width
            );
        }
        let _ = writeln!(
            svg,
            "      <text x=\"{x:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"{anchor}\">{}</text>",
            y + 4.0,
            format_count(value)
        );
    }
}

fn x_label(svg: &mut String, x: f64, plot: &Plot, label: &str) {
    let _ = writeln!(
        svg,
        "      <text x=\"{x:.1}\" y=\"{:.1}\" font-size=\"11\" text-anchor=\"middle\">{}</text>",
        plot.bottom + 16.0,
        escape(&truncate_label(label, 24))
    );
}

fn legend(svg: &mut String, entries: &[(String, &str)]) {
    let top = CHART_HEIGHT - MARGIN_BOTTOM + 40.0;
    let column_width = (CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / LEGEND_COLUMNS as f64;
    for (i, (name, color)) in entries.iter().enumerate() {
        let x = MARGIN_LEFT + (i % LEGEND_COLUMNS) as f64 * column_width;
        let y = top + (i / LEGEND_COLUMNS) as f64 * 18.0;
        let _ = writeln!(
            svg,
            "      <rect x=\"{x:.1}\" y=\"{:.1}\" width=\"10\" height=\"10\" fill=\"{color}\"/>\
             <text x=\"{:.1}\" y=\"{y:.1}\" font-size=\"11\">{}</text>",
            y - 9.0,
            x + 14.0,
            escape(&truncate_label(name, 40))
        );
    }
}

/// Week columns as categories, one series per top-level chart row
fn weekly_chart(chart: &WeeklyTable, week_labels: &[String]) -> StackedChart {
    StackedChart {
        categories: week_labels.to_vec(),
        series: chart
            .rows
            .iter()
            .map(|row| ChartSeries {
                name: row.key.top().to_string(),
                values: row.values.clone(),
            })
            .collect(),
    }
}

/// Stacked bars: one bar per category, one segment per series
fn stacked_bar_chart(chart: &StackedChart, label: &str, value_label: &str) -> String {
    let plot = Plot::new();
    let max = chart.category_totals().into_iter().max().unwrap_or(0);
    let slot = plot.slot(chart.categories.len());
    let bar_width = slot * 0.6;
    let colors: Vec<&str> = chart
        .series
        .iter()
        .enumerate()
        .map(|(i, series)| series_color(&series.name, i))
        .collect();

    let mut svg = svg_open(label);
    y_axis(&mut svg, &plot, max, false);

    for (col, category) in chart.categories.iter().enumerate() {
        let x = MARGIN_LEFT + slot * col as f64 + (slot - bar_width) / 2.0;
        let mut cursor = plot.bottom;
        for (series, color) in chart.series.iter().zip(&colors) {
            let value = series.values.get(col).copied().unwrap_or(0);
            if value == 0 {
                continue;
            }
            let h = plot.scale(value, max);
            cursor -= h;
            let _ = writeln!(
                svg,
                "      <rect x=\"{x:.1}\" y=\"{cursor:.1}\" width=\"{bar_width:.1}\" height=\"{h:.1}\" fill=\"{color}\">\
                 <title>{}&#10;{}&#10;{}: {}</title></rect>",
                escape(&series.name),
                escape(category),
                escape(value_label),
                format_count(value)
            );
        }
        x_label(&mut svg, x + bar_width / 2.0, &plot, category);
    }

    let entries: Vec<(String, &str)> = chart
        .series
        .iter()
        .zip(&colors)
        .map(|(series, color)| (series.name.clone(), *color))
        .collect();
    legend(&mut svg, &entries);
    svg.push_str(SVG_CLOSE);
    svg
}

/// Engaged sessions as bars (left axis), key events as a line (right axis)
fn performance_chart(rows: &[PerformanceRow]) -> String {
    let plot = Plot::new();
    let max_sessions = rows.iter().map(|r| r.engaged_sessions).max().unwrap_or(0);
    let max_events = rows.iter().map(|r| r.key_events).max().unwrap_or(0);
    let slot = plot.slot(rows.len());
    let bar_width = slot * 0.6;

    let mut svg = svg_open("Campaign performance");
    y_axis(&mut svg, &plot, max_sessions, false);
    y_axis(&mut svg, &plot, max_events, true);

    let mut points: Vec<String> = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let x = MARGIN_LEFT + slot * i as f64 + (slot - bar_width) / 2.0;
        let h = plot.scale(row.engaged_sessions, max_sessions);
        let name = row.key.to_string();
        let _ = writeln!(
            svg,
            "      <rect x=\"{x:.1}\" y=\"{:.1}\" width=\"{bar_width:.1}\" height=\"{h:.1}\" fill=\"{}\">\
             <title>{}&#10;Engaged Sessions: {}</title></rect>",
            plot.bottom - h,
            PALETTE_CAMPAIGNS[i % PALETTE_CAMPAIGNS.len()],
            escape(&name),
            format_count(row.engaged_sessions)
        );
        let cx = x + bar_width / 2.0;
        points.push(format!(
            "{cx:.1},{:.1}",
            plot.bottom - plot.scale(row.key_events, max_events)
        ));
        x_label(&mut svg, cx, &plot, row.key.top());
    }

    if !points.is_empty() {
        let _ = writeln!(
            svg,
            "      <polyline points=\"{}\" fill=\"none\" stroke=\"{KEY_EVENTS_LINE_COLOR}\" stroke-width=\"2\"/>",
            points.join(" ")
        );
    }

    legend(
        &mut svg,
        &[
            ("Engaged Sessions".to_string(), PALETTE_CAMPAIGNS[0]),
            ("Key Events".to_string(), KEY_EVENTS_LINE_COLOR),
        ],
    );
    svg.push_str(SVG_CLOSE);
    svg
}

/// Bar colors for the performance chart, cycled
const PALETTE_CAMPAIGNS: [&str; 5] = ["#004b57", "#00a0b2", "#abb222", "#FF736E", "#317a1c"];

fn series_color(name: &str, index: usize) -> &'static str {
    CHANNEL_COLORS
        .iter()
        .find(|(channel, _)| *channel == name)
        .map(|(_, color)| *color)
        .unwrap_or(PALETTE[index % PALETTE.len()])
}

// ========== formatting ==========

/// 1234567 → "1,234,567"
pub fn format_count(value: u64) -> String {
    value.to_formatted_string(&Locale::en)
}

/// 0.1234 → "12.34%"
pub fn format_rate(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let cut: String = label.chars().take(max_chars).collect();
    format!("{}...", cut)
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
