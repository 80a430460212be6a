//! Weekly web-analytics reporting: fetch rows, bucket them into weeks,
//! rank and collapse groups, then render HTML tables and charts.

pub mod cli;
pub mod config;
pub mod services;
pub mod types;
