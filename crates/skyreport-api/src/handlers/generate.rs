//! Generate-report handler: runs one delivery cycle and streams the PDF back.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use serde::Deserialize;
use skyreport_core::AppError;

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub video_link: Option<String>,
}

/// Run a generate-report cycle over the staged fragments.
///
/// On success the response body is the (possibly size-reduced) PDF, served
/// as an attachment named after the normalized report identity. On failure
/// the caller gets the structured error payload; either way the staging
/// area has been cleared by the orchestrator.
#[tracing::instrument(
    skip(state, request),
    fields(request_id = %uuid::Uuid::new_v4(), operation = "generate_report")
)]
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<GenerateRequest>,
) -> Result<Response, HttpAppError> {
    let generated = state
        .orchestrator
        .generate(request.video_link.as_deref())
        .await?;

    tracing::info!(
        filename = %generated.filename,
        violations = generated.violation_count,
        compressed = generated.compressed,
        size_bytes = generated.size_bytes,
        "Report ready"
    );

    let data = tokio::fs::read(&generated.path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read artifact: {}", e)))?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", generated.filename),
        )
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
