//! Display model implementations for table and JSON output
//!
//! Display models transform export types into CLI-friendly formats
//! with appropriate column names and serialization.

mod category;
mod common;
mod report;

pub use category::CategoryDisplay;
pub use report::ReportDisplay;
