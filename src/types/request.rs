//! Request types for the reporting data source

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date range in the API's own vocabulary: `YYYY-MM-DD`, `yesterday`,
/// `NdaysAgo`, `today`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

impl DateRange {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }
}

/// Concrete inclusive calendar period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Page subtitle, e.g. "December 03, 2023 - January 13, 2024"
    pub fn header(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%B %d, %Y"),
            self.end.format("%B %d, %Y")
        )
    }

    pub fn to_date_range(&self) -> DateRange {
        DateRange::new(
            self.start.format("%Y-%m-%d").to_string(),
            self.end.format("%Y-%m-%d").to_string(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    Dimension { name: String, desc: bool },
    Metric { name: String, desc: bool },
}

impl OrderBy {
    pub fn dimension_desc(name: &str) -> Self {
        OrderBy::Dimension {
            name: name.to_string(),
            desc: true,
        }
    }

    pub fn metric_desc(name: &str) -> Self {
        OrderBy::Metric {
            name: name.to_string(),
            desc: true,
        }
    }
}

/// Everything `ReportingSource::fetch_rows` needs for one call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub property_id: String,
    pub dimensions: Vec<String>,
    pub metrics: Vec<String>,
    pub date_range: DateRange,
    pub order_bys: Vec<OrderBy>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_header() {
        let period = Period::new(
            NaiveDate::from_ymd_opt(2023, 12, 3).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 13).unwrap(),
        );
        assert_eq!(period.header(), "December 03, 2023 - January 13, 2024");
    }

    #[test]
    fn test_period_to_date_range() {
        let period = Period::new(
            NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 13).unwrap(),
        );
        assert_eq!(
            period.to_date_range(),
            DateRange::new("2024-01-07", "2024-01-13")
        );
    }

    #[test]
    fn test_date_range_serializes_camel_case() {
        let json = serde_json::to_value(DateRange::new("42daysAgo", "yesterday")).unwrap();
        assert_eq!(json["startDate"], "42daysAgo");
        assert_eq!(json["endDate"], "yesterday");
    }
}
