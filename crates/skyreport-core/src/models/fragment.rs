use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One uploaded JSON submission from a drone-inspection run.
///
/// Both fields are optional on the wire: a fragment with neither is still
/// accepted and contributes nothing but its staging slot. Violations are
/// opaque structured values; this service never inspects their shape.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Fragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drone_id: Option<String>,
    #[serde(default)]
    pub violations: Vec<JsonValue>,
}

impl Fragment {
    pub fn new(drone_id: Option<String>, violations: Vec<JsonValue>) -> Self {
        Self {
            drone_id,
            violations,
        }
    }
}
