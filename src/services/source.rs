//! Reporting data sources
//!
//! `DataApiSource` calls the Analytics Data API `runReport` method.
//! `FixtureSource` replays saved responses from a JSON file, for offline
//! runs and tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::{Config, ACCESS_TOKEN_ENV};
use crate::types::{OrderBy, RawRow, ReportError, ReportRequest, Result};

/// Upper bound the API accepts for a single page
const MAX_ROWS_PER_REQUEST: u64 = 250_000;

/// Anything that can answer a report request with raw rows
pub trait ReportingSource: Send + Sync {
    /// Source name for log lines (e.g., "data-api")
    fn name(&self) -> &str;

    /// Fetch every row for `request`. Failures are fatal for the report run.
    fn fetch_rows(&self, request: &ReportRequest) -> Result<Vec<RawRow>>;
}

/// `runReport` response body, reduced to what the pipeline reads
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    /// Absent when the report has no rows
    #[serde(default)]
    pub rows: Vec<ResponseRow>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRow {
    #[serde(default)]
    pub dimension_values: Vec<ResponseValue>,
    #[serde(default)]
    pub metric_values: Vec<ResponseValue>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseValue {
    #[serde(default)]
    pub value: String,
}

impl RunReportResponse {
    /// Rows as the pipeline reads them; used by both sources
    pub fn raw_rows(&self) -> Vec<RawRow> {
        self.rows
            .iter()
            .map(|row| RawRow {
                dimensions: row.dimension_values.iter().map(|v| v.value.clone()).collect(),
                metrics: row.metric_values.iter().map(|v| v.value.clone()).collect(),
            })
            .collect()
    }
}

/// Build the JSON body of a `runReport` call
pub fn request_body(request: &ReportRequest) -> Value {
    let order_bys: Vec<Value> = request
        .order_bys
        .iter()
        .map(|order| match order {
            OrderBy::Dimension { name, desc } => {
                json!({ "dimension": { "dimensionName": name }, "desc": desc })
            }
            OrderBy::Metric { name, desc } => {
                json!({ "metric": { "metricName": name }, "desc": desc })
            }
        })
        .collect();

    json!({
        "dimensions": request.dimensions.iter().map(|d| json!({ "name": d })).collect::<Vec<_>>(),
        "metrics": request.metrics.iter().map(|m| json!({ "name": m })).collect::<Vec<_>>(),
        "dateRanges": [request.date_range],
        "orderBys": order_bys,
        "limit": MAX_ROWS_PER_REQUEST.to_string(),
    })
}

/// Analytics Data API v1beta client
pub struct DataApiSource {
    client: reqwest::blocking::Client,
    base_url: String,
    access_token: String,
}

impl DataApiSource {
    /// Token from the config file or `GA_ACCESS_TOKEN`
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_access_token(config, config.access_token())
    }

    /// `access_token` is the already resolved token; `None` is a config error
    pub fn with_access_token(config: &Config, access_token: Option<String>) -> Result<Self> {
        let access_token = access_token.ok_or_else(|| {
            ReportError::Config(format!(
                "no access token: set access_token in the config file or {}",
                ACCESS_TOKEN_ENV
            ))
        })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ReportError::UpstreamFetch(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn endpoint(&self, property_id: &str) -> String {
        format!(
            "{}/v1beta/properties/{}:runReport",
            self.base_url, property_id
        )
    }
}

impl ReportingSource for DataApiSource {
    fn name(&self) -> &str {
        "data-api"
    }

    fn fetch_rows(&self, request: &ReportRequest) -> Result<Vec<RawRow>> {
        let url = self.endpoint(&request.property_id);
        debug!(%url, dimensions = ?request.dimensions, "runReport");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request_body(request))
            .send()
            .map_err(|e| ReportError::UpstreamFetch(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ReportError::UpstreamFetch(format!(
                "HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let parsed: RunReportResponse = response
            .json()
            .map_err(|e| ReportError::UpstreamFetch(format!("JSON parse error: {}", e)))?;
        info!(
            rows = parsed.rows.len(),
            row_count = ?parsed.row_count,
            "fetched report rows"
        );
        Ok(parsed.raw_rows())
    }
}

/// One saved response, matched on the request's dimensions and metrics
#[derive(Debug, Deserialize)]
struct FixtureEntry {
    dimensions: Vec<String>,
    metrics: Vec<String>,
    #[serde(flatten)]
    response: RunReportResponse,
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
    responses: Vec<FixtureEntry>,
}

/// Replays `runReport` responses saved in a JSON file:
///
/// ```json
/// { "responses": [ { "dimensions": ["date"], "metrics": ["engagedSessions"], "rows": [] } ] }
/// ```
pub struct FixtureSource {
    path: PathBuf,
    entries: Vec<FixtureEntry>,
}

impl FixtureSource {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let file: FixtureFile = serde_json::from_str(&content)
            .map_err(|e| ReportError::Parse(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            path: path.to_path_buf(),
            entries: file.responses,
        })
    }
}

impl ReportingSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    fn fetch_rows(&self, request: &ReportRequest) -> Result<Vec<RawRow>> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.dimensions == request.dimensions && e.metrics == request.metrics)
            .ok_or_else(|| {
                ReportError::UpstreamFetch(format!(
                    "{} has no response for dimensions {:?} / metrics {:?}",
                    self.path.display(),
                    request.dimensions,
                    request.metrics
                ))
            })?;

        Ok(entry.response.raw_rows())
    }
}
