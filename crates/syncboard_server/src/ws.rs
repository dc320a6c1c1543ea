//! WebSocket transport adapter.
//!
//! Bridges one axum WebSocket to the coordinator: inbound frames become
//! [`CoordinatorHandle`] events, [`Outbound`] frames become socket writes.

use crate::connection::{ConnectionId, Link, Outbound};
use crate::handle::CoordinatorHandle;
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{Sink, SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) async fn upgrade(
    ws: WebSocketUpgrade,
    State(coordinator): State<CoordinatorHandle>,
) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, coordinator))
}

/// Runs one connection until either side ends it.
async fn serve_socket(socket: WebSocket, coordinator: CoordinatorHandle) {
    let Link {
        id,
        mut frames,
        terminated,
    } = match coordinator.connect() {
        Ok(link) => link,
        Err(e) => {
            warn!(error = %e, "rejecting connection");
            return;
        }
    };
    let (mut sink, mut stream) = socket.split();

    // Returning drops the socket without a close handshake.
    loop {
        tokio::select! {
            biased;
            () = terminated.cancelled() => {
                debug!(connection = %id, "socket terminated");
                return;
            }
            frame = frames.recv() => {
                let message = match frame {
                    Some(Outbound::Text(text)) => Message::Text(text.to_string().into()),
                    Some(Outbound::Ping) => Message::Ping(Bytes::new()),
                    None => {
                        debug!(connection = %id, "connection released by coordinator");
                        return;
                    }
                };
                match deliver(&mut sink, message, &terminated).await {
                    Delivery::Sent => {}
                    Delivery::Terminated => {
                        debug!(connection = %id, "socket terminated during write");
                        return;
                    }
                    Delivery::Failed(e) => {
                        report(&coordinator, id, e);
                        return;
                    }
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if coordinator.message(id, text.as_str()).is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => {
                        if coordinator.message(id, text).is_err() {
                            return;
                        }
                    }
                    Err(_) => warn!(connection = %id, "dropping non-utf8 binary frame"),
                },
                Some(Ok(Message::Pong(_))) => {
                    if coordinator.pong(id).is_err() {
                        return;
                    }
                }
                // Pings are answered by the websocket layer.
                Some(Ok(Message::Ping(_))) => {}
                Some(Ok(Message::Close(_))) | None => {
                    // The coordinator may already be gone during shutdown.
                    let _ = coordinator.disconnect(id);
                    return;
                }
                Some(Err(e)) => {
                    report(&coordinator, id, e);
                    return;
                }
            },
        }
    }
}

#[derive(Debug)]
enum Delivery<E> {
    Sent,
    Terminated,
    Failed(E),
}

/// Writes one frame unless the link is terminated first.
///
/// A peer that stops reading can stall the write indefinitely; termination
/// abandons it.
async fn deliver<S, T>(sink: &mut S, frame: T, terminated: &CancellationToken) -> Delivery<S::Error>
where
    S: Sink<T> + Unpin,
{
    tokio::select! {
        biased;
        () = terminated.cancelled() => Delivery::Terminated,
        sent = sink.send(frame) => match sent {
            Ok(()) => Delivery::Sent,
            Err(e) => Delivery::Failed(e),
        },
    }
}

fn report(coordinator: &CoordinatorHandle, id: ConnectionId, error: axum::Error) {
    debug!(connection = %id, error = %error, "websocket error");
    // The coordinator may already be gone during shutdown.
    let _ = coordinator.error(id, error);
}
