//! Snapshot backend trait definition.

use crate::error::StoreResult;
use async_trait::async_trait;

/// A slot holding exactly one serialized snapshot.
///
/// Backends are **opaque byte stores**: `write` replaces the whole content,
/// `read` returns whatever the last successful `write` stored. There is no
/// versioning and no partial-write protocol.
///
/// # Implementors
///
/// - [`super::FileBackend`] - For persistent storage
/// - [`super::InMemoryBackend`] - For testing
#[async_trait]
pub trait SnapshotBackend: Send + Sync + std::fmt::Debug {
    /// Makes sure the storage location exists (creating directories as needed).
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be created.
    async fn prepare(&self) -> StoreResult<()>;

    /// Reads the stored snapshot, or `None` if nothing has been written yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the location exists but cannot be read.
    async fn read(&self) -> StoreResult<Option<Vec<u8>>>;

    /// Replaces the stored snapshot with `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. The previous content may be lost.
    async fn write(&self, bytes: &[u8]) -> StoreResult<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}
