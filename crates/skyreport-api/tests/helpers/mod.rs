//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p skyreport-api --test report_test`.
//! The app is wired directly against temp directories, no telemetry init,
//! so tests never fight over a global subscriber or shared disk state.

use std::path::PathBuf;
use std::sync::Arc;

use axum_test::TestServer;
use skyreport_api::setup::routes;
use skyreport_api::state::AppState;
use skyreport_api::ReportOrchestrator;
use skyreport_core::Config;
use skyreport_pdf::PdfRenderer;
use skyreport_staging::{LocalStaging, StagingArea};
use tempfile::TempDir;

/// Test application: server plus the owned temp directories backing it.
pub struct TestApp {
    pub server: TestServer,
    pub staging_dir: PathBuf,
    pub report_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Number of fragment files currently on disk in the staging directory.
    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(&self.staging_dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        e.file_name()
                            .to_string_lossy()
                            .starts_with("fragment_")
                    })
                    .count()
            })
            .unwrap_or(0)
    }
}

fn test_config(staging_dir: PathBuf, report_dir: PathBuf) -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "development".to_string(),
        staging_dir,
        report_dir,
        max_upload_size_bytes: 10 * 1024 * 1024,
        render_timeout_secs: 30,
        compress_timeout_secs: 30,
        email_notifications_enabled: false,
        email_recipients: vec![],
        smtp_host: None,
        smtp_port: None,
        smtp_user: None,
        smtp_password: None,
        smtp_from: None,
        smtp_tls: true,
    }
}

/// Setup a test app with isolated staging and report directories.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let staging_dir = temp_dir.path().join("staging");
    let report_dir = temp_dir.path().join("reports");
    let config = test_config(staging_dir.clone(), report_dir.clone());

    let store = LocalStaging::new(&config.staging_dir).await.unwrap();
    let staging = Arc::new(StagingArea::new(Arc::new(store)));
    tokio::fs::create_dir_all(&config.report_dir).await.unwrap();

    let orchestrator = ReportOrchestrator::new(
        &config,
        staging.clone(),
        Arc::new(PdfRenderer::new()),
        None,
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        staging,
        orchestrator,
    });

    let router = routes::setup_routes(&config, state).unwrap();
    let server = TestServer::new(router).unwrap();

    TestApp {
        server,
        staging_dir,
        report_dir,
        _temp_dir: temp_dir,
    }
}
