//! Configuration module
//!
//! Environment-driven configuration for the report service: server, staging
//! and report directories, pipeline timeouts, and SMTP notification settings.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STAGING_DIR: &str = "temp_reports";
const DEFAULT_REPORT_DIR: &str = "reports";
const DEFAULT_MAX_UPLOAD_SIZE_MB: usize = 10;
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_COMPRESS_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SMTP_PORT: u16 = 587;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub staging_dir: PathBuf,
    pub report_dir: PathBuf,
    pub max_upload_size_bytes: usize,
    pub render_timeout_secs: u64,
    pub compress_timeout_secs: u64,
    // Email / report notifications
    pub email_notifications_enabled: bool,
    pub email_recipients: Vec<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Best-effort .env loading; missing file is fine
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let cors_origins = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_MB);

        let email_recipients = env::var("EMAIL_RECIPIENTS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            server_port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            cors_origins,
            environment,
            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STAGING_DIR)),
            report_dir: env::var("REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_REPORT_DIR)),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            render_timeout_secs: env::var("RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RENDER_TIMEOUT_SECS),
            compress_timeout_secs: env::var("COMPRESS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_COMPRESS_TIMEOUT_SECS),
            email_notifications_enabled: env::var("EMAIL_NOTIFICATIONS_ENABLED")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            email_recipients,
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|v| v.parse().ok()),
            smtp_user: env::var("SMTP_USER").ok().or_else(|| env::var("EMAIL_USER").ok()),
            smtp_password: env::var("SMTP_PASSWORD")
                .ok()
                .or_else(|| env::var("EMAIL_PASS").ok()),
            smtp_from: env::var("SMTP_FROM").ok().or_else(|| env::var("EMAIL_USER").ok()),
            smtp_tls: env::var("SMTP_TLS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(true),
        })
    }

    /// Validate configuration - fail fast on misconfiguration.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_bytes == 0 {
            anyhow::bail!("MAX_UPLOAD_SIZE_MB must be greater than zero");
        }
        if self.render_timeout_secs == 0 || self.compress_timeout_secs == 0 {
            anyhow::bail!("pipeline timeouts must be greater than zero");
        }
        if self.email_notifications_enabled {
            if self.smtp_host.is_none() || self.smtp_from.is_none() {
                anyhow::bail!(
                    "EMAIL_NOTIFICATIONS_ENABLED=true requires SMTP_HOST and SMTP_FROM"
                );
            }
            if self.email_recipients.is_empty() {
                anyhow::bail!("EMAIL_NOTIFICATIONS_ENABLED=true requires EMAIL_RECIPIENTS");
            }
        }
        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn compress_timeout(&self) -> Duration {
        Duration::from_secs(self.compress_timeout_secs)
    }

    pub fn smtp_port_or_default(&self) -> u16 {
        self.smtp_port.unwrap_or(DEFAULT_SMTP_PORT)
    }
}
