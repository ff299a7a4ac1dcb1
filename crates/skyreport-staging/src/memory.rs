use async_trait::async_trait;
use skyreport_core::Fragment;
use tokio::sync::RwLock;

use crate::traits::{StagedFragment, StagingResult, StagingStore};

/// In-memory staging backend for tests and embedded use.
#[derive(Default)]
pub struct MemoryStaging {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    next_sequence: u64,
    entries: Vec<StagedFragment>,
}

impl MemoryStaging {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryInner {
                next_sequence: 1,
                entries: Vec::new(),
            }),
        }
    }
}

#[async_trait]
impl StagingStore for MemoryStaging {
    async fn append(&self, fragment: &Fragment) -> StagingResult<u64> {
        let mut inner = self.inner.write().await;
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.entries.push(StagedFragment {
            sequence,
            fragment: fragment.clone(),
        });
        Ok(sequence)
    }

    async fn list(&self) -> StagingResult<Vec<StagedFragment>> {
        Ok(self.inner.read().await.entries.clone())
    }

    async fn clear(&self) -> StagingResult<()> {
        self.inner.write().await.entries.clear();
        Ok(())
    }

    async fn len(&self) -> StagingResult<usize> {
        Ok(self.inner.read().await.entries.len())
    }
}
