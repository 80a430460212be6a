//! Type definitions for gareport

mod error;
mod report;
mod request;

pub use error::*;
pub use report::*;
pub use request::*;
