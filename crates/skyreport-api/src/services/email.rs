//! Email notification service for generated reports via SMTP.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use skyreport_core::Config;
use thiserror::Error;
use tracing::info;

/// Notification failures. Absorbed by the orchestrator: logged, never
/// surfaced to the caller, never aborting a cycle.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid message: {0}")]
    Message(String),

    #[error("SMTP transport failed: {0}")]
    Transport(String),

    #[error("Attachment unreadable: {0}")]
    Attachment(#[from] std::io::Error),
}

/// Notification collaborator interface: best-effort, attachment optional.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        subject: &str,
        body: &str,
        attachment_path: Option<&Path>,
    ) -> Result<(), NotifyError>;
}

/// Email service for sending report notifications.
/// No-op if notifications are disabled or SMTP is not configured.
#[derive(Clone)]
pub struct EmailService {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
    recipients: Vec<String>,
}

impl EmailService {
    /// Create email service from config. Returns `None` if disabled or SMTP not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.email_notifications_enabled {
            tracing::debug!("Report notifications disabled (EMAIL_NOTIFICATIONS_ENABLED=false)");
            return None;
        }
        let host = config.smtp_host.as_deref()?;
        let from = config.smtp_from.clone()?;
        let port = config.smtp_port_or_default();

        let mailer = if config.smtp_tls {
            let b = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).ok()?;
            let b = b.port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(
                host = %host,
                port = port,
                "Email service initialized (SMTP with STARTTLS)"
            );
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = if let (Some(u), Some(p)) = (&config.smtp_user, &config.smtp_password) {
                b.credentials(Credentials::new(u.clone(), p.clone()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
            recipients: config.email_recipients.clone(),
        })
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn notify(
        &self,
        subject: &str,
        body: &str,
        attachment_path: Option<&Path>,
    ) -> Result<(), NotifyError> {
        if self.recipients.is_empty() {
            return Ok(());
        }
        let to_addrs: Vec<Mailbox> = self
            .recipients
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        if to_addrs.is_empty() {
            return Err(NotifyError::Message(
                "No valid recipient addresses".to_string(),
            ));
        }
        let from_addr: Mailbox = self
            .from
            .parse()
            .map_err(|e| NotifyError::Message(format!("Invalid SMTP_FROM: {}", e)))?;

        let mut builder = Message::builder().from(from_addr).subject(subject);
        for mb in &to_addrs {
            builder = builder.to(mb.clone());
        }

        // Only attach when the artifact actually exists; a failure-path
        // notification still goes out as plain text.
        let attachment = match attachment_path {
            Some(path) if path.exists() => {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "report.pdf".to_string());
                let data = tokio::fs::read(path).await?;
                Some((filename, data))
            }
            _ => None,
        };

        let email = match attachment {
            Some((filename, data)) => {
                let pdf_type = ContentType::parse("application/pdf")
                    .map_err(|e| NotifyError::Message(e.to_string()))?;
                builder
                    .multipart(
                        MultiPart::mixed()
                            .singlepart(SinglePart::plain(body.to_string()))
                            .singlepart(Attachment::new(filename).body(data, pdf_type)),
                    )
                    .map_err(|e| NotifyError::Message(e.to_string()))?
            }
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(body.to_string())
                .map_err(|e| NotifyError::Message(e.to_string()))?,
        };

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        info!(recipients = self.recipients.len(), "Report notification sent");
        Ok(())
    }
}
