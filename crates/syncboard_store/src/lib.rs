//! # Syncboard Store
//!
//! Durable home for the board state.
//!
//! This crate provides two layers:
//! - [`SnapshotBackend`]: an opaque byte slot holding one serialized snapshot
//! - [`StateStore`]: the cached [`ApplicationState`] plus the load/seed/save policy
//!
//! Backends do not interpret the bytes they hold; the store owns the JSON format.
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - A single JSON file, rewritten in full on every save
//! - [`InMemoryBackend`] - For tests; can be told to fail
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use syncboard_protocol::ApplicationState;
//! use syncboard_store::{InMemoryBackend, SnapshotSource, StateStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = StateStore::new(Arc::new(InMemoryBackend::new()), ApplicationState::default());
//! assert_eq!(store.initialize().await.unwrap(), SnapshotSource::Seeded);
//! assert!(store.state().last_updated > 0);
//! # }
//! ```
//!
//! [`ApplicationState`]: syncboard_protocol::ApplicationState

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod backend;
mod error;
mod file;
mod memory;
mod store;

pub use backend::SnapshotBackend;
pub use error::{StoreError, StoreResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use store::{SnapshotSource, StateStore};
