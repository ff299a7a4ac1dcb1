//! Delivery orchestrator: merge -> render -> reduce -> notify -> clean.
//!
//! One generate-report cycle runs linearly to completion or failure. The
//! staging cycle guard is held for the whole cycle so the fragment listing
//! and the unconditional clear at the end form one critical section, and the
//! clear runs on every exit path - a failed render still discards the staged
//! fragments (deliberate policy: stale fragments would poison the next run).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use skyreport_core::{merge_fragments, AppError, Config, Fragment};
use skyreport_pdf::{prepare_reduction, ReductionOutcome, ReportRenderer};
use skyreport_staging::{CycleGuard, StagingArea, StagingError};

use crate::services::email::Notifier;

/// Successful cycle output handed back to the HTTP layer.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub path: PathBuf,
    pub filename: String,
    pub drone_id: String,
    pub violation_count: usize,
    pub compressed: bool,
    pub size_bytes: u64,
}

pub struct ReportOrchestrator {
    staging: Arc<StagingArea>,
    renderer: Arc<dyn ReportRenderer>,
    notifier: Option<Arc<dyn Notifier>>,
    report_dir: PathBuf,
    render_timeout: Duration,
    compress_timeout: Duration,
}

impl ReportOrchestrator {
    pub fn new(
        config: &Config,
        staging: Arc<StagingArea>,
        renderer: Arc<dyn ReportRenderer>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            staging,
            renderer,
            notifier,
            report_dir: config.report_dir.clone(),
            render_timeout: config.render_timeout(),
            compress_timeout: config.compress_timeout(),
        }
    }

    /// Run one generate-report cycle. Staging is cleared on every exit path,
    /// including validation failures: a rejected request discards uploads too.
    #[tracing::instrument(skip(self), fields(operation = "generate_report"))]
    pub async fn generate(&self, video_link: Option<&str>) -> Result<GeneratedReport, AppError> {
        let cycle = self.staging.begin_cycle().await;
        let result = self.run_cycle(&cycle, video_link).await;

        if result.is_err() {
            tracing::warn!("Cycle failed; staged fragments are discarded");
        }
        if let Err(e) = cycle.clear().await {
            // The cycle outcome stands; a clear failure only leaves stale files.
            tracing::error!(error = %e, "Failed to clear staging area");
        }

        result
    }

    async fn run_cycle(
        &self,
        cycle: &CycleGuard<'_>,
        video_link: Option<&str>,
    ) -> Result<GeneratedReport, AppError> {
        let video_link = video_link
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::MissingField("video_link".to_string()))?;

        let staged = cycle.list().await.map_err(staging_to_app)?;
        let fragments: Vec<Fragment> = staged.into_iter().map(|s| s.fragment).collect();
        tracing::info!(fragments = fragments.len(), "Merging staged fragments");

        let report = merge_fragments(&fragments, video_link)?;
        let filename = report.artifact_filename();
        let artifact_path = self.report_dir.join(&filename);

        self.render(&report, &artifact_path).await?;
        tracing::info!(path = %artifact_path.display(), "Report rendered");

        let outcome = self.reduce_artifact(&artifact_path).await;

        if let Some(notifier) = &self.notifier {
            let subject = format!("Drone report generated: {}", report.drone_id);
            let body = format!(
                "Report status: SUCCESS\n\nDrone ID: {}\nTotal violations: {}\nVideo link: {}\n",
                report.drone_id,
                report.violations.len(),
                report.video_link,
            );
            if let Err(e) = notifier.notify(&subject, &body, Some(&artifact_path)).await {
                tracing::warn!(error = %e, "Report notification failed");
            }
        }

        let size_bytes = tokio::fs::metadata(&artifact_path).await?.len();

        Ok(GeneratedReport {
            path: artifact_path,
            filename,
            drone_id: report.drone_id,
            violation_count: report.violations.len(),
            compressed: outcome.compressed,
            size_bytes,
        })
    }

    /// Render the report on the blocking pool, bounded by the render timeout.
    ///
    /// The renderer writes to a unique scratch path; only this method moves
    /// the result onto the artifact path. A render that overruns its timeout
    /// keeps writing the scratch file but can never land on the artifact.
    async fn render(
        &self,
        report: &skyreport_core::CombinedReport,
        artifact_path: &std::path::Path,
    ) -> Result<(), AppError> {
        let renderer = self.renderer.clone();
        let report = report.clone();
        let scratch = scratch_path(artifact_path, "render");
        let task_scratch = scratch.clone();
        let task = tokio::task::spawn_blocking(move || renderer.render(&report, &task_scratch));

        match tokio::time::timeout(self.render_timeout, task).await {
            Ok(Ok(Ok(()))) => tokio::fs::rename(&scratch, artifact_path)
                .await
                .map_err(|e| {
                    AppError::Render(format!("Failed to move rendered artifact into place: {}", e))
                }),
            Ok(Ok(Err(e))) => {
                let _ = tokio::fs::remove_file(&scratch).await;
                Err(AppError::Render(e.to_string()))
            }
            Ok(Err(join_err)) => {
                let _ = tokio::fs::remove_file(&scratch).await;
                Err(AppError::Render(format!("Renderer panicked: {}", join_err)))
            }
            Err(_) => Err(AppError::Render(format!(
                "Renderer timed out after {:?}",
                self.render_timeout
            ))),
        }
    }

    /// Size-reduce the artifact, bounded by the compress timeout. Failure or
    /// timeout never gates progress; the artifact path stays valid either way.
    ///
    /// The blocking pass only prepares a candidate on a scratch path;
    /// promotion over the artifact happens here, after the timeout check, so
    /// a late candidate is discarded instead of replacing a newer artifact.
    async fn reduce_artifact(&self, artifact_path: &std::path::Path) -> ReductionOutcome {
        let original_bytes = tokio::fs::metadata(artifact_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        let unchanged = ReductionOutcome::unchanged(original_bytes);

        let path = artifact_path.to_path_buf();
        let scratch = scratch_path(artifact_path, "reduce");
        let task = tokio::task::spawn_blocking(move || prepare_reduction(&path, &scratch));

        match tokio::time::timeout(self.compress_timeout, task).await {
            Ok(Ok(Some(candidate))) => match candidate.promote(artifact_path) {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to promote reduced artifact");
                    unchanged
                }
            },
            Ok(Ok(None)) => unchanged,
            Ok(Err(join_err)) => {
                tracing::warn!(error = %join_err, "Size reduction task panicked");
                unchanged
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.compress_timeout,
                    "Size reduction timed out, using current artifact"
                );
                unchanged
            }
        }
    }
}

/// Unique sibling path for in-flight render/reduce output. Uniqueness keeps
/// a detached task from a previous cycle writing into a live scratch file.
fn scratch_path(artifact_path: &std::path::Path, tag: &str) -> PathBuf {
    let mut name = artifact_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}-{}.tmp", tag, uuid::Uuid::new_v4().simple()));
    artifact_path.with_file_name(name)
}

fn staging_to_app(err: StagingError) -> AppError {
    match err {
        StagingError::InvalidFragment(msg) => AppError::InvalidInput(msg),
        other => AppError::Staging(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use skyreport_core::CombinedReport;
    use skyreport_pdf::{PdfRenderer, RenderError};
    use skyreport_staging::{MemoryStaging, StagingStore};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FailingRenderer;

    impl ReportRenderer for FailingRenderer {
        fn render(&self, _report: &CombinedReport, _path: &Path) -> Result<(), RenderError> {
            Err(RenderError::Timeout)
        }
    }

    struct SlowRenderer {
        delay: Duration,
    }

    impl ReportRenderer for SlowRenderer {
        fn render(&self, report: &CombinedReport, path: &Path) -> Result<(), RenderError> {
            std::thread::sleep(self.delay);
            PdfRenderer::new().render(report, path)
        }
    }

    struct RecordingNotifier {
        calls: Mutex<Vec<(String, Option<PathBuf>)>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(
            &self,
            subject: &str,
            _body: &str,
            attachment_path: Option<&Path>,
        ) -> Result<(), crate::services::NotifyError> {
            self.calls
                .lock()
                .unwrap()
                .push((subject.to_string(), attachment_path.map(Path::to_path_buf)));
            if self.fail {
                Err(crate::services::NotifyError::Transport(
                    "connection refused".to_string(),
                ))
            } else {
                Ok(())
            }
        }
    }

    fn config(report_dir: &Path) -> Config {
        Config {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            staging_dir: report_dir.join("staging"),
            report_dir: report_dir.to_path_buf(),
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

    async fn staged_area(fragments: &[Fragment]) -> Arc<StagingArea> {
        let store = Arc::new(MemoryStaging::new());
        for fragment in fragments {
            store.append(fragment).await.unwrap();
        }
        Arc::new(StagingArea::new(store))
    }

    #[tokio::test]
    async fn full_cycle_produces_artifact_and_clears_staging() {
        let dir = tempdir().unwrap();
        let staging = staged_area(&[
            Fragment::new(Some("site_a_001".to_string()), vec![json!({"kind": "ppe"})]),
            Fragment::new(Some("site_b".to_string()), vec![json!({"kind": "speed"})]),
        ])
        .await;

        let orchestrator = ReportOrchestrator::new(
            &config(dir.path()),
            staging.clone(),
            Arc::new(PdfRenderer::new()),
            None,
        );

        let generated = orchestrator.generate(Some("https://example.com/run")).await.unwrap();
        assert_eq!(generated.filename, "SITE_A.pdf");
        assert_eq!(generated.drone_id, "SITE_A");
        assert_eq!(generated.violation_count, 2);
        assert!(generated.path.exists());
        assert!(generated.size_bytes > 0);

        let cycle = staging.begin_cycle().await;
        assert!(cycle.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_staging_fails_and_stays_empty() {
        let dir = tempdir().unwrap();
        let staging = staged_area(&[]).await;
        let orchestrator = ReportOrchestrator::new(
            &config(dir.path()),
            staging.clone(),
            Arc::new(PdfRenderer::new()),
            None,
        );

        let err = orchestrator.generate(Some("https://example.com/run")).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyStaging(_)));
    }

    #[tokio::test]
    async fn render_failure_still_clears_staging() {
        let dir = tempdir().unwrap();
        let staging = staged_area(&[Fragment::new(
            Some("site_a".to_string()),
            vec![json!({"kind": "ppe"})],
        )])
        .await;

        let orchestrator = ReportOrchestrator::new(
            &config(dir.path()),
            staging.clone(),
            Arc::new(FailingRenderer),
            None,
        );

        let err = orchestrator.generate(Some("https://example.com/run")).await.unwrap_err();
        assert!(matches!(err, AppError::Render(_)));

        let cycle = staging.begin_cycle().await;
        assert!(cycle.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn render_timeout_surfaces_render_error() {
        let dir = tempdir().unwrap();
        let staging = staged_area(&[Fragment::new(
            Some("site_a".to_string()),
            vec![json!({"kind": "ppe"})],
        )])
        .await;

        let mut orchestrator = ReportOrchestrator::new(
            &config(dir.path()),
            staging.clone(),
            Arc::new(SlowRenderer {
                delay: Duration::from_millis(300),
            }),
            None,
        );
        orchestrator.render_timeout = Duration::from_millis(50);

        let err = orchestrator
            .generate(Some("https://example.com/run"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Render(_)));

        let cycle = staging.begin_cycle().await;
        assert!(cycle.list().await.unwrap().is_empty());
        drop(cycle);

        // The overrunning render finishes later but only ever writes its
        // scratch file; the artifact path must stay absent.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!dir.path().join("SITE_A.pdf").exists());
    }

    #[tokio::test]
    async fn compress_timeout_leaves_artifact_uncompressed() {
        let dir = tempdir().unwrap();
        let staging = staged_area(&[Fragment::new(
            Some("site_a".to_string()),
            (0..200).map(|i| json!({"id": i, "kind": "speeding"})).collect(),
        )])
        .await;

        let mut orchestrator = ReportOrchestrator::new(
            &config(dir.path()),
            staging,
            Arc::new(PdfRenderer::new()),
            None,
        );
        orchestrator.compress_timeout = Duration::from_nanos(1);

        let generated = orchestrator
            .generate(Some("https://example.com/run"))
            .await
            .unwrap();
        assert!(!generated.compressed);
        let rendered = std::fs::read(&generated.path).unwrap();
        assert_eq!(generated.size_bytes, rendered.len() as u64);

        // The reduction pass keeps running past the timeout; its candidate is
        // never promoted, so the artifact bytes do not change underneath us.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(std::fs::read(&generated.path).unwrap(), rendered);
    }

    #[tokio::test]
    async fn missing_video_link_still_clears_staging() {
        let dir = tempdir().unwrap();
        let staging = staged_area(&[Fragment::new(
            Some("site_a".to_string()),
            vec![json!({"kind": "ppe"})],
        )])
        .await;

        let orchestrator = ReportOrchestrator::new(
            &config(dir.path()),
            staging.clone(),
            Arc::new(PdfRenderer::new()),
            None,
        );

        let err = orchestrator.generate(Some("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::MissingField(_)));

        let cycle = staging.begin_cycle().await;
        assert!(cycle.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn notification_failure_does_not_abort_cycle() {
        let dir = tempdir().unwrap();
        let staging = staged_area(&[Fragment::new(
            Some("site_a".to_string()),
            vec![json!({"kind": "ppe"})],
        )])
        .await;

        let notifier = Arc::new(RecordingNotifier {
            calls: Mutex::new(vec![]),
            fail: true,
        });
        let orchestrator = ReportOrchestrator::new(
            &config(dir.path()),
            staging,
            Arc::new(PdfRenderer::new()),
            Some(notifier.clone()),
        );

        let generated = orchestrator.generate(Some("https://example.com/run")).await.unwrap();
        assert!(generated.path.exists());

        let calls = notifier.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("SITE_A"));
        assert_eq!(calls[0].1.as_deref(), Some(generated.path.as_path()));
    }
}
