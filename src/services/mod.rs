//! Report pipeline stages, data sources and output

pub mod aggregator;
pub mod batch;
pub mod catalog;
pub mod collapser;
pub mod normalizer;
pub mod performance;
pub mod pipeline;
pub mod projector;
pub mod ranked;
pub mod renderer;
pub mod runner;
pub mod source;
pub mod summary;
pub mod week;
pub mod window;

pub use aggregator::Aggregator;
pub use runner::ReportRunner;
pub use source::{DataApiSource, FixtureSource, ReportingSource};
