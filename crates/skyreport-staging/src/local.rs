use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use skyreport_core::Fragment;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::traits::{StagedFragment, StagingError, StagingResult, StagingStore};

const FRAGMENT_PREFIX: &str = "fragment_";
const FRAGMENT_EXT: &str = "json";

/// Local filesystem staging backend.
///
/// One `fragment_<seq>.json` file per upload under the staging directory.
/// The sequence counter is recovered from the directory contents at startup,
/// so restarts never reuse a live sequence number.
pub struct LocalStaging {
    base_path: PathBuf,
    next_sequence: AtomicU64,
}

impl LocalStaging {
    /// Create a new LocalStaging instance rooted at `base_path`.
    /// The directory is created if missing.
    pub async fn new(base_path: impl Into<PathBuf>) -> StagingResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StagingError::ConfigError(format!(
                "Failed to create staging directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let highest = Self::highest_sequence(&base_path).await?;

        Ok(LocalStaging {
            base_path,
            next_sequence: AtomicU64::new(highest + 1),
        })
    }

    fn fragment_path(&self, sequence: u64) -> PathBuf {
        self.base_path
            .join(format!("{}{:06}.{}", FRAGMENT_PREFIX, sequence, FRAGMENT_EXT))
    }

    /// Parse `fragment_<seq>.json` back to its sequence number.
    fn parse_sequence(path: &Path) -> Option<u64> {
        let stem = path.file_stem()?.to_str()?;
        if path.extension()?.to_str()? != FRAGMENT_EXT {
            return None;
        }
        stem.strip_prefix(FRAGMENT_PREFIX)?.parse().ok()
    }

    async fn highest_sequence(base_path: &Path) -> StagingResult<u64> {
        let mut highest = 0;
        let mut entries = fs::read_dir(base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(seq) = Self::parse_sequence(&entry.path()) {
                highest = highest.max(seq);
            }
        }
        Ok(highest)
    }

    async fn staged_paths(&self) -> StagingResult<Vec<(u64, PathBuf)>> {
        let mut found = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await.map_err(|e| {
            StagingError::ListFailed(format!(
                "Failed to read staging directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if let Some(seq) = Self::parse_sequence(&path) {
                found.push((seq, path));
            }
        }
        found.sort_by_key(|(seq, _)| *seq);
        Ok(found)
    }
}

#[async_trait]
impl StagingStore for LocalStaging {
    async fn append(&self, fragment: &Fragment) -> StagingResult<u64> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        let path = self.fragment_path(sequence);

        let data = serde_json::to_vec(fragment)
            .map_err(|e| StagingError::InvalidFragment(format!("Serialization failed: {}", e)))?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StagingError::AppendFailed(format!("Failed to create {}: {}", path.display(), e))
        })?;
        file.write_all(&data).await.map_err(|e| {
            StagingError::AppendFailed(format!("Failed to write {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StagingError::AppendFailed(format!("Failed to sync {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            sequence,
            size_bytes = data.len(),
            "Fragment staged"
        );

        Ok(sequence)
    }

    async fn list(&self) -> StagingResult<Vec<StagedFragment>> {
        let mut fragments = Vec::new();
        for (sequence, path) in self.staged_paths().await? {
            let data = fs::read(&path).await.map_err(|e| {
                StagingError::ListFailed(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let fragment: Fragment = serde_json::from_slice(&data).map_err(|e| {
                StagingError::InvalidFragment(format!(
                    "Corrupt staged fragment {}: {}",
                    path.display(),
                    e
                ))
            })?;
            fragments.push(StagedFragment { sequence, fragment });
        }
        Ok(fragments)
    }

    async fn clear(&self) -> StagingResult<()> {
        let paths = self.staged_paths().await?;
        let count = paths.len();
        for (_, path) in paths {
            fs::remove_file(&path).await.map_err(|e| {
                StagingError::ClearFailed(format!("Failed to delete {}: {}", path.display(), e))
            })?;
        }
        tracing::info!(cleared = count, "Staging area cleared");
        Ok(())
    }

    async fn len(&self) -> StagingResult<usize> {
        Ok(self.staged_paths().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn fragment(drone_id: &str) -> Fragment {
        Fragment::new(Some(drone_id.to_string()), vec![json!({"id": drone_id})])
    }

    #[tokio::test]
    async fn append_then_list_preserves_order() {
        let dir = tempdir().unwrap();
        let staging = LocalStaging::new(dir.path()).await.unwrap();

        staging.append(&fragment("a")).await.unwrap();
        staging.append(&fragment("b")).await.unwrap();
        staging.append(&fragment("c")).await.unwrap();

        let staged = staging.list().await.unwrap();
        let ids: Vec<_> = staged
            .iter()
            .map(|s| s.fragment.drone_id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(staged.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }

    #[tokio::test]
    async fn clear_empties_the_directory() {
        let dir = tempdir().unwrap();
        let staging = LocalStaging::new(dir.path()).await.unwrap();

        staging.append(&fragment("a")).await.unwrap();
        staging.append(&fragment("b")).await.unwrap();
        assert_eq!(staging.len().await.unwrap(), 2);

        staging.clear().await.unwrap();
        assert!(staging.is_empty().await.unwrap());
        assert!(staging.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sequence_survives_restart() {
        let dir = tempdir().unwrap();
        {
            let staging = LocalStaging::new(dir.path()).await.unwrap();
            staging.append(&fragment("a")).await.unwrap();
            staging.append(&fragment("b")).await.unwrap();
        }

        // A fresh instance over the same directory must not reuse sequences.
        let staging = LocalStaging::new(dir.path()).await.unwrap();
        let seq = staging.append(&fragment("c")).await.unwrap();
        assert!(seq > 2);

        let staged = staging.list().await.unwrap();
        assert_eq!(staged.len(), 3);
        assert_eq!(staged.last().unwrap().fragment.drone_id.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn foreign_files_are_ignored() {
        let dir = tempdir().unwrap();
        tokio::fs::write(dir.path().join("README.txt"), b"not a fragment")
            .await
            .unwrap();

        let staging = LocalStaging::new(dir.path()).await.unwrap();
        staging.append(&fragment("a")).await.unwrap();

        assert_eq!(staging.len().await.unwrap(), 1);
        staging.clear().await.unwrap();
        // The foreign file is untouched by clear.
        assert!(dir.path().join("README.txt").exists());
    }
}
