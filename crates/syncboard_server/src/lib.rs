//! # Syncboard Server
//!
//! Real-time relay server for a shared board.
//!
//! This crate provides:
//! - [`Coordinator`]: the connection registry, relay and liveness sweep
//! - [`Persister`]: the background writer that mirrors committed state to disk
//! - A WebSocket adapter and HTTP router (health check, CORS)
//! - [`SyncServer`]: wiring of all of the above onto a TCP listener
//!
//! # Architecture
//!
//! The coordinator is a single task draining one event queue. Socket tasks
//! never touch the registry; they post [`CoordinatorHandle`] events
//! (connect, message, pong, disconnect, error) and forward whatever the
//! coordinator puts on their [`Outbound`] channel until their [`Link`] is
//! terminated. Pong bookkeeping and the
//! periodic sweep therefore run strictly one after the other.
//!
//! # Protocol
//!
//! 1. On connect the client receives `INIT_STATE` with the current board
//! 2. A `DROP_UPDATE` from a client replaces the board, then is relayed
//! 3. Any other frame is relayed unchanged to every other client
//! 4. Clients that miss two consecutive pings are dropped

#![deny(unsafe_code)]
#![warn(missing_docs)]
// Production code MUST NOT use panic!/unwrap()/expect()
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod connection;
mod coordinator;
mod error;
mod handle;
mod http;
mod persister;
mod server;
mod ws;

pub use config::ServerConfig;
pub use connection::{ConnectionId, Link, Liveness, Outbound};
pub use coordinator::{Coordinator, CoordinatorStats};
pub use error::{ServerError, ServerResult};
pub use handle::CoordinatorHandle;
pub use http::{router, HEALTH_PATH};
pub use persister::{best_effort, Persister};
pub use server::{RunningServer, SyncServer};
