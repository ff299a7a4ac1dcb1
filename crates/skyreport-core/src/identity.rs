//! Report identity normalization.
//!
//! Drone uploads carry noisy identifiers like `site_a_007` where the trailing
//! digits are a batch/sequence tag, not part of the site name. The report
//! filename and email subject both use the normalized form.

use std::sync::LazyLock;

use regex::Regex;

/// Placeholder identity used when the first fragment carries no `drone_id`.
pub const DEFAULT_IDENTITY: &str = "Drone_Report";

// End-anchored so `zone_7_cam` keeps its interior tag.
static BATCH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_\d+$").expect("batch suffix regex is valid"));

/// Derive a stable `UPPER_SNAKE_CASE` report name from a raw identifier.
///
/// Strips a trailing `_<digits>` batch tag, then folds underscores/spaces and
/// upper-cases. Total: any input (or none) yields a usable name.
pub fn normalize_identity(raw: Option<&str>) -> String {
    // An empty identifier would produce an unusable `.pdf` filename.
    let raw = raw.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_IDENTITY);
    let stripped = BATCH_SUFFIX.replace(raw, "");
    stripped.replace('_', " ").to_uppercase().replace(' ', "_")
}
