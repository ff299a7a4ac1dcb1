//! Data models for the application
//!
//! Fragments are the raw uploaded JSON submissions; the combined report is
//! the merged record handed to the PDF renderer.

mod fragment;
mod report;

pub use fragment::Fragment;
pub use report::{CombinedReport, REPORT_LOCATION};
