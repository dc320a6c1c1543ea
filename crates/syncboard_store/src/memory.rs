//! In-memory snapshot backend for testing.

use crate::backend::SnapshotBackend;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// An in-memory snapshot slot.
///
/// Besides holding bytes, it can be switched into failure modes to exercise
/// the store's error paths:
/// - [`set_fail_prepare`](Self::set_fail_prepare) makes `prepare` fail
/// - [`set_fail_writes`](Self::set_fail_writes) makes `write` fail without
///   touching the stored bytes
///
/// # Example
///
/// ```rust
/// use syncboard_store::InMemoryBackend;
///
/// let backend = InMemoryBackend::with_data(b"{}".to_vec());
/// assert_eq!(backend.data(), Some(b"{}".to_vec()));
/// assert_eq!(backend.write_count(), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<Option<Vec<u8>>>,
    fail_prepare: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that already holds `data`.
    ///
    /// Useful for testing startup recovery.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(Some(data)),
            ..Self::default()
        }
    }

    /// Returns a copy of the stored bytes.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes subsequent `prepare` calls fail.
    pub fn set_fail_prepare(&self, fail: bool) {
        self.fail_prepare.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `write` calls fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotBackend for InMemoryBackend {
    async fn prepare(&self) -> StoreResult<()> {
        if self.fail_prepare.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("prepare disabled".into()));
        }
        Ok(())
    }

    async fn read(&self) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.read().clone())
    }

    async fn write(&self, bytes: &[u8]) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        *self.data.write() = Some(bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".into()
    }
}
