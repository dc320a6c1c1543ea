//! Producer side of the coordinator's event queue.

use crate::connection::{ConnectionId, Link, Outbound};
use crate::coordinator::CoordinatorStats;
use crate::error::{ServerError, ServerResult};
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Everything the coordinator task reacts to besides its timer.
#[derive(Debug)]
pub(crate) enum Event {
    Connected {
        id: ConnectionId,
        outbound: mpsc::UnboundedSender<Outbound>,
        terminated: CancellationToken,
    },
    Message {
        id: ConnectionId,
        text: String,
    },
    Pong {
        id: ConnectionId,
    },
    Disconnected {
        id: ConnectionId,
    },
    Errored {
        id: ConnectionId,
        error: String,
    },
    Stats {
        reply: oneshot::Sender<CoordinatorStats>,
    },
    Shutdown,
}

/// Cloneable handle used by transports to report connection events.
///
/// Every method only enqueues; the coordinator task applies events in the
/// order they were enqueued. Methods fail with
/// [`ServerError::CoordinatorClosed`] once the task has stopped.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    events: mpsc::UnboundedSender<Event>,
    next_id: Arc<AtomicU64>,
}

impl CoordinatorHandle {
    pub(crate) fn new(events: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            events,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn post(&self, event: Event) -> ServerResult<()> {
        self.events
            .send(event)
            .map_err(|_| ServerError::CoordinatorClosed)
    }

    /// Registers a new connection.
    ///
    /// Returns the transport's [`Link`]. The first frame on it is always the
    /// `INIT_STATE` snapshot.
    pub fn connect(&self) -> ServerResult<Link> {
        let id = ConnectionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (outbound, frames) = mpsc::unbounded_channel();
        let terminated = CancellationToken::new();
        self.post(Event::Connected {
            id,
            outbound,
            terminated: terminated.clone(),
        })?;
        Ok(Link {
            id,
            frames,
            terminated,
        })
    }

    /// Reports a text frame received from `id`.
    pub fn message(&self, id: ConnectionId, text: impl Into<String>) -> ServerResult<()> {
        self.post(Event::Message {
            id,
            text: text.into(),
        })
    }

    /// Reports a pong received from `id`.
    pub fn pong(&self, id: ConnectionId) -> ServerResult<()> {
        self.post(Event::Pong { id })
    }

    /// Reports that `id` closed.
    pub fn disconnect(&self, id: ConnectionId) -> ServerResult<()> {
        self.post(Event::Disconnected { id })
    }

    /// Reports a transport failure on `id`.
    pub fn error(&self, id: ConnectionId, error: impl Display) -> ServerResult<()> {
        self.post(Event::Errored {
            id,
            error: error.to_string(),
        })
    }

    /// Asks the coordinator for its counters.
    pub async fn stats(&self) -> ServerResult<CoordinatorStats> {
        let (reply, answer) = oneshot::channel();
        self.post(Event::Stats { reply })?;
        answer.await.map_err(|_| ServerError::CoordinatorClosed)
    }

    /// Stops the liveness timer and the coordinator task.
    ///
    /// Events already queued ahead of the shutdown are still applied; live
    /// connections are not closed explicitly.
    pub fn shutdown(&self) {
        // Already stopped is fine.
        let _ = self.post(Event::Shutdown);
    }

    /// Returns true once the coordinator task has stopped.
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }
}
