//! # Syncboard Protocol
//!
//! Board data model and wire messages for syncboard.
//!
//! This crate provides:
//! - [`Item`], [`Section`] and [`ApplicationState`], the shared board document
//! - [`ServerMessage`] for server-originated frames (`INIT_STATE`)
//! - [`Envelope`] for client frames, parsed just enough to route them
//! - [`seed::default_board`], the deployment roster used on first run
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Wire format
//!
//! Every frame is a JSON object with a string `type` tag:
//!
//! | Tag | Direction | Payload |
//! |-----|-----------|---------|
//! | `INIT_STATE` | server → client | `{ state }` |
//! | `DROP_UPDATE` | client → server → peers | `{ sections, items }` |
//! | anything else | client → server → peers | opaque |

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;
mod model;
pub mod seed;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{DropUpdate, Envelope, MessageKind, ServerMessage, DROP_UPDATE, INIT_STATE};
pub use model::{ApplicationState, Item, ItemId, Section, SectionId};
