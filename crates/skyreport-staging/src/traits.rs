//! Staging store abstraction trait
//!
//! All staging backends (local filesystem, in-memory) implement this trait so
//! the orchestrator can work against an injected handle instead of ambient
//! process state.

use async_trait::async_trait;
use skyreport_core::Fragment;
use thiserror::Error;

/// Staging operation errors
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Append failed: {0}")]
    AppendFailed(String),

    #[error("Listing failed: {0}")]
    ListFailed(String),

    #[error("Clear failed: {0}")]
    ClearFailed(String),

    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for staging operations
pub type StagingResult<T> = Result<T, StagingError>;

/// A fragment together with the staging sequence number assigned on upload.
/// Sequence numbers are monotonically increasing and define arrival order.
#[derive(Debug, Clone)]
pub struct StagedFragment {
    pub sequence: u64,
    pub fragment: Fragment,
}

/// Staging store abstraction
///
/// Backends persist one entry per upload, keyed by a monotonically increasing
/// sequence number. `list` returns entries in sequence order; `clear` removes
/// every entry and resets nothing else (the sequence keeps climbing so a
/// concurrent upload can never collide with a cleared slot).
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Append a fragment and return its assigned sequence number.
    async fn append(&self, fragment: &Fragment) -> StagingResult<u64>;

    /// List all staged fragments in sequence (arrival) order.
    async fn list(&self) -> StagingResult<Vec<StagedFragment>>;

    /// Remove every staged fragment.
    async fn clear(&self) -> StagingResult<()>;

    /// Number of staged fragments.
    async fn len(&self) -> StagingResult<usize>;

    async fn is_empty(&self) -> StagingResult<bool> {
        Ok(self.len().await? == 0)
    }
}
