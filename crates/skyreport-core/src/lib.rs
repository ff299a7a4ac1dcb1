//! Skyreport Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! report-assembly primitives (identity normalization and fragment merging)
//! shared across all skyreport components.

pub mod config;
pub mod error;
pub mod identity;
pub mod merge;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use identity::normalize_identity;
pub use merge::merge_fragments;
pub use models::{CombinedReport, Fragment};
