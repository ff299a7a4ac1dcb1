//! Service layer: report delivery orchestration and notifications.

pub mod email;
pub mod orchestrator;

pub use email::{EmailService, Notifier, NotifyError};
