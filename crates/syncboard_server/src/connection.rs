//! Per-connection bookkeeping.

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::SendError};
use tokio_util::sync::CancellationToken;

/// Identity of one accepted connection. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// What the coordinator asks a socket task to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Send a text frame.
    Text(Arc<str>),
    /// Send a liveness ping.
    Ping,
}

/// The transport's end of a registered connection.
#[derive(Debug)]
pub struct Link {
    /// Connection id.
    pub id: ConnectionId,
    /// Frames to deliver, in order. Ends when the coordinator forgets the
    /// connection.
    pub frames: mpsc::UnboundedReceiver<Outbound>,
    /// Cancelled when the coordinator terminates the connection. The transport
    /// must then drop the socket at once, abandoning any write in progress.
    pub terminated: CancellationToken,
}

/// Liveness of a registered connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Answered the most recent ping, or has not been pinged yet.
    Alive,
    /// Pinged by the last sweep and not answered yet.
    Stale,
}

/// A registered connection as seen by the coordinator.
#[derive(Debug)]
pub(crate) struct Peer {
    outbound: mpsc::UnboundedSender<Outbound>,
    terminated: CancellationToken,
    pub(crate) liveness: Liveness,
}

impl Peer {
    pub(crate) fn new(
        outbound: mpsc::UnboundedSender<Outbound>,
        terminated: CancellationToken,
    ) -> Self {
        Self {
            outbound,
            terminated,
            liveness: Liveness::Alive,
        }
    }

    /// Queues a frame; fails once the socket task has gone away.
    pub(crate) fn send(&self, frame: Outbound) -> Result<(), SendError<Outbound>> {
        self.outbound.send(frame)
    }

    pub(crate) fn terminate(&self) {
        self.terminated.cancel();
    }
}
