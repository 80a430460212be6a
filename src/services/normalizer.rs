//! Row normalization service
//!
//! Turns a raw API row into a typed `(GroupKey, date, value)` triple,
//! dropping rows whose top-level key is excluded.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{GroupKey, RawRow, ReportError, Result};

/// Where the key, date and metric live inside a raw row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLayout {
    /// Dimension indices composing the group key, top-level first
    pub key_dimensions: Vec<usize>,
    pub date_dimension: usize,
    #[serde(default)]
    pub metric_index: usize,
    /// Top-level key values to drop, e.g. "(direct)", "(not set)"
    #[serde(default)]
    pub excluded: BTreeSet<String>,
}

impl RowLayout {
    pub fn new(key_dimensions: Vec<usize>, date_dimension: usize) -> Self {
        Self {
            key_dimensions,
            date_dimension,
            metric_index: 0,
            excluded: BTreeSet::new(),
        }
    }

    pub fn excluding<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(values.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    pub key: GroupKey,
    pub date: NaiveDate,
    pub value: u64,
}

/// Normalize one row. `Ok(None)` means the row was excluded.
pub fn normalize_row(row: &RawRow, layout: &RowLayout) -> Result<Option<NormalizedRow>> {
    let key = group_key(row, &layout.key_dimensions)?;
    if layout.excluded.contains(key.top()) {
        return Ok(None);
    }

    let date_str = row.dimension(layout.date_dimension).ok_or_else(|| {
        ReportError::MissingField(format!("date dimension {}", layout.date_dimension))
    })?;
    let metric_str = row
        .metric(layout.metric_index)
        .ok_or_else(|| ReportError::MissingField(format!("metric {}", layout.metric_index)))?;

    Ok(Some(NormalizedRow {
        key,
        date: parse_date(date_str)?,
        value: parse_metric(metric_str)?,
    }))
}

/// Build the group key from the given dimension indices
pub fn group_key(row: &RawRow, indices: &[usize]) -> Result<GroupKey> {
    let fields = indices
        .iter()
        .map(|&i| {
            row.dimension(i)
                .map(str::to_string)
                .ok_or_else(|| ReportError::MissingField(format!("key dimension {}", i)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(GroupKey::new(fields))
}

/// Parse an 8-digit `YYYYMMDD` date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReportError::MalformedDate(s.to_string()));
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|_| ReportError::MalformedDate(s.to_string()))
}

/// Parse a non-negative decimal integer metric value
pub fn parse_metric(s: &str) -> Result<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReportError::MalformedMetric(s.to_string()));
    }
    s.parse::<u64>()
        .map_err(|_| ReportError::MalformedMetric(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign_layout() -> RowLayout {
        RowLayout::new(vec![0, 1], 2).excluding(["(direct)", "(organic)", "(referral)", "(not set)"])
    }

    // ========== normalize_row() tests ==========

    #[test]
    fn test_normalize_two_level_key() {
        let row = RawRow::new(["spring_sale", "google / cpc", "20240108"], ["42"]);

        let result = normalize_row(&row, &campaign_layout()).unwrap().unwrap();

        assert_eq!(result.key.fields(), &["spring_sale", "google / cpc"]);
        assert_eq!(result.date, NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(result.value, 42);
    }

    #[test]
    fn test_normalize_excluded_top_level() {
        let row = RawRow::new(["(direct)", "(none)", "20240108"], ["42"]);
        assert!(normalize_row(&row, &campaign_layout()).unwrap().is_none());
    }

    #[test]
    fn test_exclusion_only_checks_first_component() {
        let row = RawRow::new(["spring_sale", "(not set)", "20240108"], ["1"]);
        assert!(normalize_row(&row, &campaign_layout()).unwrap().is_some());
    }

    #[test]
    fn test_excluded_row_skips_parsing() {
        // Excluded rows are dropped before their date is looked at
        let row = RawRow::new(["(not set)", "", "garbage"], ["x"]);
        assert!(normalize_row(&row, &campaign_layout()).unwrap().is_none());
    }

    #[test]
    fn test_normalize_malformed_date() {
        let row = RawRow::new(["a", "b", "2024-01-08"], ["1"]);
        let err = normalize_row(&row, &campaign_layout()).unwrap_err();
        assert!(matches!(err, ReportError::MalformedDate(_)));
    }

    #[test]
    fn test_normalize_malformed_metric() {
        let row = RawRow::new(["a", "b", "20240108"], ["12.5"]);
        let err = normalize_row(&row, &campaign_layout()).unwrap_err();
        assert!(matches!(err, ReportError::MalformedMetric(_)));
    }

    #[test]
    fn test_normalize_missing_dimension() {
        let row = RawRow::new(["a"], ["1"]);
        let err = normalize_row(&row, &campaign_layout()).unwrap_err();
        assert!(matches!(err, ReportError::MissingField(_)));
    }

    #[test]
    fn test_normalize_selects_metric_index() {
        let mut layout = RowLayout::new(vec![0], 1);
        layout.metric_index = 1;
        let row = RawRow::new(["Direct", "20240108"], ["7", "9"]);
        assert_eq!(normalize_row(&row, &layout).unwrap().unwrap().value, 9);
    }

    // ========== parse_date() tests ==========

    #[test]
    fn test_parse_date_valid() {
        assert_eq!(
            parse_date("20240229").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_parse_date_rejects_impossible_day() {
        assert!(parse_date("20230229").is_err());
    }

    #[test]
    fn test_parse_date_rejects_wrong_length() {
        assert!(parse_date("2024018").is_err());
        assert!(parse_date("202401080").is_err());
        assert!(parse_date("").is_err());
    }

    // ========== parse_metric() tests ==========

    #[test]
    fn test_parse_metric_valid() {
        assert_eq!(parse_metric("0").unwrap(), 0);
        assert_eq!(parse_metric("123456").unwrap(), 123456);
    }

    #[test]
    fn test_parse_metric_rejects_sign_and_space() {
        assert!(parse_metric("-3").is_err());
        assert!(parse_metric("+3").is_err());
        assert!(parse_metric(" 3").is_err());
        assert!(parse_metric("").is_err());
    }

    #[test]
    fn test_parse_metric_rejects_overflow() {
        assert!(parse_metric("99999999999999999999999").is_err());
    }
}
