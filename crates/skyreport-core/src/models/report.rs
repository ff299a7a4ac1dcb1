use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Constant location label stamped on every combined report.
pub const REPORT_LOCATION: &str = "Combined Site Report";

/// The merge result: one canonical report record per generate-report request.
///
/// `violations` is the flatten-concatenation of every staged fragment's
/// violations in arrival order; `drone_id` is the normalized identity derived
/// from the first fragment. Not persisted beyond the PDF it produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedReport {
    pub location: String,
    /// Creation day at merge time, `YYYY-MM-DD`.
    pub date: String,
    pub drone_id: String,
    pub video_link: String,
    pub violations: Vec<JsonValue>,
}

impl CombinedReport {
    /// Filename the rendered artifact is written under.
    pub fn artifact_filename(&self) -> String {
        format!("{}.pdf", self.drone_id)
    }
}
