//! PDF rendering and size reduction for combined reports.
//!
//! The renderer turns a [`skyreport_core::CombinedReport`] into a PDF file;
//! the compression pass then prepares a smaller copy on a scratch path,
//! which the caller promotes over the artifact or discards.

mod compress;
mod renderer;

pub use compress::{prepare_reduction, ReductionCandidate, ReductionOutcome};
pub use renderer::{PdfRenderer, RenderError, ReportRenderer};
