//! Fragment upload handler.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use skyreport_core::Fragment;

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    /// Staging sequence number assigned to this fragment (arrival order).
    pub sequence: u64,
}

/// Stage one uploaded JSON fragment.
///
/// Both `drone_id` and `violations` are optional; an empty object is a valid
/// (if useless) fragment. Fragments accumulate until the next
/// generate-report cycle consumes them.
#[tracing::instrument(skip(state, fragment), fields(operation = "upload_fragment"))]
pub async fn upload_fragment(
    State(state): State<Arc<AppState>>,
    ValidatedJson(fragment): ValidatedJson<Fragment>,
) -> Result<impl IntoResponse, HttpAppError> {
    let sequence = state.staging.add(&fragment).await.map_err(HttpAppError::from)?;

    tracing::info!(
        sequence,
        drone_id = fragment.drone_id.as_deref().unwrap_or("<none>"),
        violations = fragment.violations.len(),
        "Fragment staged"
    );

    Ok(Json(UploadResponse {
        message: "fragment stored".to_string(),
        sequence,
    }))
}
