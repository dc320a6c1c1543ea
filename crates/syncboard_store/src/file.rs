//! File-based snapshot backend.

use crate::backend::SnapshotBackend;
use crate::error::StoreResult;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// A single JSON file on disk.
///
/// Data survives process restarts. Every `write` truncates and rewrites the
/// file; a crash mid-write can leave it truncated, in which case the next
/// startup treats it as unreadable and reseeds.
///
/// # Example
///
/// ```no_run
/// use syncboard_store::{FileBackend, SnapshotBackend};
///
/// # async fn demo() -> syncboard_store::StoreResult<()> {
/// let backend = FileBackend::new("data/state.json");
/// backend.prepare().await?;
/// backend.write(b"{}").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Creates a backend for the file at `path`. Nothing is touched until
    /// [`SnapshotBackend::prepare`] is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotBackend for FileBackend {
    async fn prepare(&self) -> StoreResult<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                tokio::fs::create_dir_all(parent).await?;
            }
            _ => {}
        }
        Ok(())
    }

    async fn read(&self) -> StoreResult<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, bytes: &[u8]) -> StoreResult<()> {
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
