//! Size-reduction pass over a rendered PDF.
//!
//! Lossless structural compression in two phases: [`prepare_reduction`]
//! recompresses the document into a caller-chosen scratch file and hands
//! back a candidate only when it is strictly smaller;
//! [`ReductionCandidate::promote`] renames it over the original. The
//! artifact is only ever replaced by an explicit promote, so a preparation
//! that outlives its caller cannot touch it.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::Document;
use thiserror::Error;

/// Result of one size-reduction attempt as seen by the caller.
#[derive(Debug, Clone, Copy)]
pub struct ReductionOutcome {
    pub compressed: bool,
    pub original_bytes: u64,
    pub final_bytes: u64,
}

impl ReductionOutcome {
    /// Outcome for a pass that left the artifact as-is.
    pub fn unchanged(original_bytes: u64) -> Self {
        Self {
            compressed: false,
            original_bytes,
            final_bytes: original_bytes,
        }
    }
}

#[derive(Debug, Error)]
enum CompressionError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A strictly smaller recompressed copy sitting on a scratch path.
///
/// Dropping the candidate without promoting removes the scratch file and
/// leaves the original untouched.
#[derive(Debug)]
pub struct ReductionCandidate {
    scratch: PathBuf,
    pub original_bytes: u64,
    pub candidate_bytes: u64,
    promoted: bool,
}

impl ReductionCandidate {
    /// Replace the original artifact with the smaller candidate.
    pub fn promote(mut self, path: &Path) -> std::io::Result<ReductionOutcome> {
        fs::rename(&self.scratch, path)?;
        self.promoted = true;
        Ok(ReductionOutcome {
            compressed: true,
            original_bytes: self.original_bytes,
            final_bytes: self.candidate_bytes,
        })
    }
}

impl Drop for ReductionCandidate {
    fn drop(&mut self) {
        if !self.promoted {
            let _ = fs::remove_file(&self.scratch);
        }
    }
}

fn try_prepare(path: &Path, scratch: &Path) -> Result<Option<ReductionCandidate>, CompressionError> {
    let original_bytes = fs::metadata(path)?.len();

    let mut doc = Document::load(path)?;
    doc.compress();
    doc.save(scratch)?;

    let candidate_bytes = fs::metadata(scratch)?.len();
    if candidate_bytes < original_bytes {
        Ok(Some(ReductionCandidate {
            scratch: scratch.to_path_buf(),
            original_bytes,
            candidate_bytes,
            promoted: false,
        }))
    } else {
        fs::remove_file(scratch)?;
        Ok(None)
    }
}

/// Recompress the PDF at `path` into `scratch`.
///
/// Returns a candidate only when the recompressed copy is strictly smaller.
/// Best-effort: malformed input, I/O failure, or a result that is not
/// strictly smaller all yield `None` with the original file untouched and
/// the scratch file removed.
pub fn prepare_reduction(path: &Path, scratch: &Path) -> Option<ReductionCandidate> {
    match try_prepare(path, scratch) {
        Ok(Some(candidate)) => {
            tracing::debug!(
                path = %path.display(),
                original_bytes = candidate.original_bytes,
                candidate_bytes = candidate.candidate_bytes,
                "PDF reduction candidate prepared"
            );
            Some(candidate)
        }
        Ok(None) => {
            tracing::info!(path = %path.display(), "PDF already compact, keeping original");
            None
        }
        Err(e) => {
            let _ = fs::remove_file(scratch);
            tracing::warn!(path = %path.display(), error = %e, "PDF size reduction failed");
            None
        }
    }
}
