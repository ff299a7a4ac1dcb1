//! Fragment staging for the report service.
//!
//! Uploaded JSON fragments accumulate in a staging area until a
//! generate-report cycle consumes them. The [`StagingStore`] trait abstracts
//! the backing store (local filesystem in production, in-memory in tests);
//! [`StagingArea`] layers the cycle lock on top so listing and the
//! unconditional clear at the end of a cycle form one critical section.

mod area;
mod local;
mod memory;
mod traits;

pub use area::{CycleGuard, StagingArea};
pub use local::LocalStaging;
pub use memory::MemoryStaging;
pub use traits::{StagedFragment, StagingError, StagingResult, StagingStore};
