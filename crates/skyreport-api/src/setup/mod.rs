//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from
//! main.rs for better organization and testability.

pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use skyreport_core::Config;
use skyreport_pdf::PdfRenderer;
use skyreport_staging::{LocalStaging, StagingArea};

use crate::services::email::{EmailService, Notifier};
use crate::services::orchestrator::ReportOrchestrator;
use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())?;

    tracing::info!("Configuration loaded and validated successfully");

    let store = LocalStaging::new(&config.staging_dir)
        .await
        .context("Failed to initialize staging directory")?;
    let staging = Arc::new(StagingArea::new(Arc::new(store)));

    tokio::fs::create_dir_all(&config.report_dir)
        .await
        .context("Failed to create report directory")?;

    let notifier =
        EmailService::from_config(&config).map(|svc| Arc::new(svc) as Arc<dyn Notifier>);
    let orchestrator = ReportOrchestrator::new(
        &config,
        staging.clone(),
        Arc::new(PdfRenderer::new()),
        notifier,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        staging,
        orchestrator,
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
