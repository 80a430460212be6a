use thiserror::Error;

/// gareport error types
#[derive(Error, Debug)]
pub enum ReportError {
    /// Date dimension is not an 8-digit YYYYMMDD value
    #[error("malformed date: {0}")]
    MalformedDate(String),

    /// Metric value is not a non-negative decimal integer
    #[error("malformed metric: {0}")]
    MalformedMetric(String),

    /// Row has fewer dimension/metric values than the layout expects
    #[error("missing field: {0}")]
    MissingField(String),

    /// Source returned no usable rows
    #[error("no data")]
    NoData,

    /// Network, auth or HTTP status failure from the reporting API
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    /// Failed to parse JSON
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl ReportError {
    /// Bad upstream data: the run must abort without output
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ReportError::MalformedDate(_)
                | ReportError::MalformedMetric(_)
                | ReportError::MissingField(_)
        )
    }
}

/// Result type alias for gareport
pub type Result<T> = std::result::Result<T, ReportError>;
