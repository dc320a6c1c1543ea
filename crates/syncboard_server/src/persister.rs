//! Background snapshot writer.

use std::fmt::Display;
use std::sync::Arc;
use syncboard_protocol::ApplicationState;
use syncboard_store::StateStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Discards a failure after logging it.
///
/// Store failures are not propagated to clients: live clients already hold the
/// state and the next mutation writes it again. Every call site that chooses
/// to keep going after a failed store operation goes through here.
pub fn best_effort<T, E: Display>(operation: &str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(operation, error = %e, "store operation failed, continuing");
            None
        }
    }
}

/// Queue in front of [`StateStore::persist`].
///
/// Snapshots are written one at a time in the order they were enqueued, so the
/// last write to land is always the most recent commit. The writer task runs
/// until every `Persister` clone is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct Persister {
    queue: mpsc::UnboundedSender<ApplicationState>,
}

impl Persister {
    /// Starts the writer task.
    pub fn spawn(store: Arc<StateStore>) -> (Self, JoinHandle<()>) {
        let (queue, pending) = mpsc::unbounded_channel();
        let task = tokio::spawn(write_loop(store, pending));
        (Self { queue }, task)
    }

    /// Schedules `snapshot` to be written. Never waits for I/O.
    pub fn enqueue(&self, snapshot: ApplicationState) {
        if self.queue.send(snapshot).is_err() {
            warn!("snapshot writer has stopped, snapshot not persisted");
        }
    }
}

async fn write_loop(store: Arc<StateStore>, mut pending: mpsc::UnboundedReceiver<ApplicationState>) {
    while let Some(snapshot) = pending.recv().await {
        best_effort("persist snapshot", store.persist(&snapshot).await);
    }
}
