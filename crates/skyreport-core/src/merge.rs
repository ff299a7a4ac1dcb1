//! Submission merger: fold staged fragments into one combined report.
//!
//! Fragment order is the staging sequence order (upload arrival). The first
//! fragment names the report; every fragment contributes its violations in
//! place. No dedup, no sort.

use chrono::Local;

use crate::error::AppError;
use crate::identity::normalize_identity;
use crate::models::{CombinedReport, Fragment, REPORT_LOCATION};

/// Merge uploaded fragments into a single [`CombinedReport`].
///
/// Fails with [`AppError::EmptyStaging`] when no fragments are staged; a
/// report cannot be generated from zero uploads. Read-only over the
/// fragments; staging cleanup is the orchestrator's responsibility.
pub fn merge_fragments(fragments: &[Fragment], video_link: &str) -> Result<CombinedReport, AppError> {
    let first = fragments.first().ok_or_else(|| {
        AppError::EmptyStaging("No fragments uploaded for this report".to_string())
    })?;

    let drone_id = normalize_identity(first.drone_id.as_deref());

    let violations = fragments
        .iter()
        .flat_map(|f| f.violations.iter().cloned())
        .collect();

    Ok(CombinedReport {
        location: REPORT_LOCATION.to_string(),
        date: Local::now().format("%Y-%m-%d").to_string(),
        drone_id,
        video_link: video_link.to_string(),
        violations,
    })
}
