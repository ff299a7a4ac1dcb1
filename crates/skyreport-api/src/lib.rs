//! Skyreport API Library
//!
//! This crate provides the HTTP API handlers, the delivery orchestrator, and
//! application setup for the drone violation report service.

mod handlers;
mod telemetry;

// Public modules
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

// Re-exports
pub use error::ErrorResponse;
pub use services::orchestrator::{GeneratedReport, ReportOrchestrator};
