//! Application state shared across handlers.

use std::sync::Arc;

use skyreport_core::Config;
use skyreport_staging::StagingArea;

use crate::services::orchestrator::ReportOrchestrator;

/// Application state: configuration, the staging area uploads land in, and
/// the orchestrator that runs generate-report cycles over it.
pub struct AppState {
    pub config: Config,
    pub staging: Arc<StagingArea>,
    pub orchestrator: ReportOrchestrator,
}
