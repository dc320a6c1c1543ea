//! Connection registry, relay and liveness sweep.

use crate::connection::{ConnectionId, Liveness, Outbound, Peer};
use crate::handle::{CoordinatorHandle, Event};
use crate::persister::Persister;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Duration;
use syncboard_protocol::{Envelope, MessageKind, ServerMessage};
use syncboard_store::StateStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Counters describing what the coordinator has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Currently registered connections.
    pub connections: usize,
    /// Connections accepted since start.
    pub accepted: u64,
    /// Messages relayed to peers.
    pub relayed: u64,
    /// Full-state mutations committed to the store.
    pub mutations: u64,
    /// Messages dropped because they did not parse.
    pub malformed: u64,
    /// Connections dropped by the liveness sweep.
    pub evicted: u64,
}

/// Owner of every live connection.
///
/// All methods are synchronous and never wait on I/O: frames go onto each
/// peer's [`Outbound`] queue and snapshot writes go to the [`Persister`]. In a
/// running server the coordinator lives inside one task (see
/// [`Coordinator::spawn`]) so its methods never run concurrently.
///
/// The registry keeps insertion order, which is also the relay order.
#[derive(Debug)]
pub struct Coordinator {
    store: Arc<StateStore>,
    persister: Persister,
    peers: IndexMap<ConnectionId, Peer>,
    stats: CoordinatorStats,
}

impl Coordinator {
    /// Creates a coordinator with an empty registry.
    pub fn new(store: Arc<StateStore>, persister: Persister) -> Self {
        Self {
            store,
            persister,
            peers: IndexMap::new(),
            stats: CoordinatorStats::default(),
        }
    }

    /// Registers a connection and queues the `INIT_STATE` snapshot for it.
    ///
    /// `terminated` is cancelled if the liveness sweep evicts the connection.
    pub fn on_connect(
        &mut self,
        id: ConnectionId,
        outbound: mpsc::UnboundedSender<Outbound>,
        terminated: CancellationToken,
    ) {
        let peer = Peer::new(outbound, terminated);
        let init = ServerMessage::InitState {
            state: self.store.state(),
        };

        match init.encode() {
            Ok(text) => {
                if peer.send(Outbound::Text(text.into())).is_err() {
                    warn!(connection = %id, "connection closed before the snapshot was sent");
                    return;
                }
            }
            Err(e) => error!(connection = %id, error = %e, "failed to encode snapshot"),
        }

        self.peers.insert(id, peer);
        self.stats.accepted += 1;
        info!(connection = %id, peers = self.peers.len(), "client connected");
    }

    /// Handles one text frame from `id`.
    ///
    /// Text that is not JSON is logged and dropped. A `DROP_UPDATE` is
    /// committed to the store and queued for persistence before the frame is
    /// relayed; every JSON frame is relayed unchanged to all other connections.
    pub fn on_message(&mut self, id: ConnectionId, text: &str) {
        if !self.peers.contains_key(&id) {
            debug!(connection = %id, "ignoring message from unregistered connection");
            return;
        }

        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.stats.malformed += 1;
                warn!(connection = %id, error = %e, "dropping malformed message");
                return;
            }
        };

        let (raw, kind) = envelope.into_parts();
        if let MessageKind::DropUpdate(update) = kind {
            let state = update.into_state();
            let duplicates = state.duplicate_item_ids();
            if !duplicates.is_empty() {
                debug!(connection = %id, ?duplicates, "mutation carries duplicate item ids");
            }
            let snapshot = self.store.commit(state);
            self.persister.enqueue(snapshot);
            self.stats.mutations += 1;
        }

        self.relay(id, &raw);
    }

    fn relay(&mut self, from: ConnectionId, raw: &Arc<str>) {
        let mut failed = Vec::new();
        let mut delivered = 0usize;
        for (&peer_id, peer) in &self.peers {
            if peer_id == from {
                continue;
            }
            if peer.send(Outbound::Text(Arc::clone(raw))).is_ok() {
                delivered += 1;
            } else {
                failed.push(peer_id);
            }
        }

        for peer_id in failed {
            self.peers.shift_remove(&peer_id);
            warn!(connection = %peer_id, "send failed, connection removed");
        }
        self.stats.relayed += 1;
        debug!(connection = %from, delivered, "relayed message");
    }

    /// Marks `id` as having answered the last ping.
    pub fn on_pong(&mut self, id: ConnectionId) {
        if let Some(peer) = self.peers.get_mut(&id) {
            peer.liveness = Liveness::Alive;
        }
    }

    /// Evicts connections that missed the previous ping and pings the rest.
    pub fn liveness_sweep(&mut self) {
        let mut evicted = Vec::new();
        self.peers.retain(|&id, peer| match peer.liveness {
            Liveness::Stale => {
                peer.terminate();
                evicted.push(id);
                false
            }
            Liveness::Alive => {
                peer.liveness = Liveness::Stale;
                if peer.send(Outbound::Ping).is_ok() {
                    true
                } else {
                    evicted.push(id);
                    false
                }
            }
        });

        for id in &evicted {
            info!(connection = %id, "connection unresponsive, terminated");
        }
        self.stats.evicted += evicted.len() as u64;
        debug!(peers = self.peers.len(), evicted = evicted.len(), "liveness sweep");
    }

    /// Forgets a connection whose transport closed.
    pub fn on_disconnect(&mut self, id: ConnectionId) {
        if self.peers.shift_remove(&id).is_some() {
            info!(connection = %id, peers = self.peers.len(), "client disconnected");
        }
    }

    /// Forgets a connection whose transport failed.
    pub fn on_error(&mut self, id: ConnectionId, error: &str) {
        if self.peers.shift_remove(&id).is_some() {
            warn!(connection = %id, error, peers = self.peers.len(), "connection error");
        }
    }

    /// Liveness of `id`, or `None` if it is not registered.
    pub fn liveness(&self, id: ConnectionId) -> Option<Liveness> {
        self.peers.get(&id).map(|peer| peer.liveness)
    }

    /// Registered connections in relay order.
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.peers.keys().copied().collect()
    }

    /// Current counters.
    pub fn stats(&self) -> CoordinatorStats {
        CoordinatorStats {
            connections: self.peers.len(),
            ..self.stats
        }
    }

    /// Moves the coordinator onto its own task.
    ///
    /// The task sweeps every `heartbeat` (first sweep one period after start)
    /// and processes events from the returned handle until
    /// [`CoordinatorHandle::shutdown`] is called or every handle is dropped.
    pub fn spawn(self, heartbeat: Duration) -> (CoordinatorHandle, JoinHandle<()>) {
        let (events, queue) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(queue, heartbeat));
        (CoordinatorHandle::new(events), task)
    }

    async fn run(mut self, mut queue: mpsc::UnboundedReceiver<Event>, heartbeat: Duration) {
        let heartbeat = heartbeat.max(Duration::from_millis(1));
        let mut ticker = time::interval_at(Instant::now() + heartbeat, heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(heartbeat_ms = heartbeat.as_millis() as u64, "coordinator started");

        loop {
            tokio::select! {
                _ = ticker.tick() => self.liveness_sweep(),
                event = queue.recv() => match event {
                    Some(Event::Shutdown) | None => break,
                    Some(event) => self.handle(event),
                },
            }
        }

        info!(peers = self.peers.len(), "coordinator stopped");
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Connected {
                id,
                outbound,
                terminated,
            } => self.on_connect(id, outbound, terminated),
            Event::Message { id, text } => self.on_message(id, &text),
            Event::Pong { id } => self.on_pong(id),
            Event::Disconnected { id } => self.on_disconnect(id),
            Event::Errored { id, error } => self.on_error(id, &error),
            Event::Stats { reply } => {
                // The requester may have given up waiting.
                let _ = reply.send(self.stats());
            }
            Event::Shutdown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use syncboard_protocol::{ApplicationState, DropUpdate, Item, Section, INIT_STATE};
    use syncboard_store::InMemoryBackend;
    use tokio::sync::mpsc::error::TryRecvError;

    struct Client {
        id: ConnectionId,
        rx: mpsc::UnboundedReceiver<Outbound>,
        terminated: CancellationToken,
    }

    impl Client {
        fn next(&mut self) -> Option<Outbound> {
            self.rx.try_recv().ok()
        }

        fn next_json(&mut self) -> Value {
            match self.next() {
                Some(Outbound::Text(text)) => serde_json::from_str(&text).unwrap(),
                other => panic!("expected a text frame, got {other:?}"),
            }
        }

        fn is_idle(&mut self) -> bool {
            matches!(self.rx.try_recv(), Err(TryRecvError::Empty))
        }

        fn is_forgotten(&mut self) -> bool {
            matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
        }
    }

    fn coordinator() -> (Coordinator, Arc<StateStore>) {
        let store = Arc::new(StateStore::new(
            Arc::new(InMemoryBackend::new()),
            ApplicationState::default(),
        ));
        let (persister, _task) = Persister::spawn(store.clone());
        (Coordinator::new(store.clone(), persister), store)
    }

    fn join(coordinator: &mut Coordinator, id: u64) -> Client {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ConnectionId::new(id);
        let terminated = CancellationToken::new();
        coordinator.on_connect(id, tx, terminated.clone());
        let mut client = Client { id, rx, terminated };
        assert_eq!(client.next_json()["type"], INIT_STATE);
        client
    }

    #[tokio::test]
    async fn snapshot_on_join() {
        let (mut coordinator, store) = coordinator();
        store.commit(ApplicationState::new(vec![Section::new(4, "s", vec![])], vec![]));

        let (tx, mut rx) = mpsc::unbounded_channel();
        coordinator.on_connect(ConnectionId::new(1), tx, CancellationToken::new());

        let Some(Outbound::Text(text)) = rx.try_recv().ok() else {
            panic!("no snapshot sent");
        };
        let message: ServerMessage = serde_json::from_str(&text).unwrap();
        assert_eq!(message, ServerMessage::InitState { state: store.state() });
        assert_eq!(coordinator.stats().connections, 1);
    }

    #[tokio::test]
    async fn relays_to_everyone_but_the_sender() {
        let (mut coordinator, _) = coordinator();
        let mut a = join(&mut coordinator, 1);
        let mut b = join(&mut coordinator, 2);
        let mut c = join(&mut coordinator, 3);

        let text = r#"{"type":"DRAG_START","itemId":9}"#;
        coordinator.on_message(a.id, text);

        assert!(a.is_idle());
        assert_eq!(b.next(), Some(Outbound::Text(text.into())));
        assert_eq!(c.next(), Some(Outbound::Text(text.into())));
        assert!(b.is_idle());
        assert!(c.is_idle());
    }

    #[tokio::test]
    async fn drop_update_commits_then_relays() {
        let (mut coordinator, store) = coordinator();
        let mut a = join(&mut coordinator, 1);
        let mut b = join(&mut coordinator, 2);
        let before = store.last_updated();

        let text = r#"{"type":"DROP_UPDATE","sections":[{"id":1,"title":"x","items":[]}],"items":[]}"#;
        coordinator.on_message(a.id, text);

        assert_eq!(b.next(), Some(Outbound::Text(text.into())));
        assert!(a.is_idle());

        let state = store.state();
        assert_eq!(state.sections, json!([{"id": 1, "title": "x", "items": []}]));
        assert_eq!(state.items, json!([]));
        assert!(state.last_updated > before);
        assert_eq!(coordinator.stats().mutations, 1);
    }

    #[tokio::test]
    async fn late_joiner_sees_latest_mutation() {
        let (mut coordinator, store) = coordinator();
        let a = join(&mut coordinator, 1);

        let update = DropUpdate::new(vec![], vec![Item::new(5, "loose")]);
        coordinator.on_message(a.id, &update.encode().unwrap());

        let (tx, mut rx) = mpsc::unbounded_channel();
        coordinator.on_connect(ConnectionId::new(2), tx, CancellationToken::new());
        let Some(Outbound::Text(text)) = rx.try_recv().ok() else {
            panic!("no snapshot sent");
        };
        let message: ServerMessage = serde_json::from_str(&text).unwrap();
        let ServerMessage::InitState { state } = message;
        assert_eq!(state, store.state());
        assert_eq!(state.items, json!([{"id": 5, "name": "loose"}]));
    }

    #[tokio::test]
    async fn malformed_message_changes_nothing() {
        let (mut coordinator, store) = coordinator();
        let mut a = join(&mut coordinator, 1);
        let mut b = join(&mut coordinator, 2);
        let before = store.state();

        coordinator.on_message(a.id, "{ definitely not json");
        coordinator.on_message(a.id, r#"{"type":"DROP_UPDATE","sections":"#);

        assert!(b.is_idle());
        assert!(a.is_idle());
        assert_eq!(store.state(), before);
        assert_eq!(coordinator.connections(), vec![a.id, b.id]);
        assert_eq!(coordinator.stats().malformed, 2);
    }

    #[tokio::test]
    async fn relay_follows_registry_order() {
        let (mut coordinator, _) = coordinator();
        let a = join(&mut coordinator, 30);
        let _b = join(&mut coordinator, 10);
        let _c = join(&mut coordinator, 20);
        coordinator.on_disconnect(ConnectionId::new(10));
        let _d = join(&mut coordinator, 5);

        assert_eq!(
            coordinator.connections(),
            vec![a.id, ConnectionId::new(20), ConnectionId::new(5)]
        );
    }

    #[tokio::test]
    async fn two_missed_sweeps_evict() {
        let (mut coordinator, _) = coordinator();
        let mut a = join(&mut coordinator, 1);

        coordinator.liveness_sweep();
        assert_eq!(a.next(), Some(Outbound::Ping));
        assert_eq!(coordinator.liveness(a.id), Some(Liveness::Stale));

        assert!(!a.terminated.is_cancelled());

        coordinator.liveness_sweep();
        assert!(a.terminated.is_cancelled());
        assert!(a.is_forgotten());
        assert_eq!(coordinator.liveness(a.id), None);
        assert_eq!(coordinator.stats().evicted, 1);
    }

    #[tokio::test]
    async fn answered_pings_keep_connection() {
        let (mut coordinator, _) = coordinator();
        let mut a = join(&mut coordinator, 1);

        for _ in 0..5 {
            coordinator.liveness_sweep();
            assert_eq!(a.next(), Some(Outbound::Ping));
            coordinator.on_pong(a.id);
            assert_eq!(coordinator.liveness(a.id), Some(Liveness::Alive));
        }
        assert!(!a.terminated.is_cancelled());
        assert_eq!(coordinator.stats().evicted, 0);
    }

    #[tokio::test]
    async fn stale_peers_still_receive_relays() {
        let (mut coordinator, _) = coordinator();
        let a = join(&mut coordinator, 1);
        let mut b = join(&mut coordinator, 2);

        coordinator.liveness_sweep();
        assert_eq!(b.next(), Some(Outbound::Ping));

        coordinator.on_message(a.id, r#"{"type":"PING_APP"}"#);
        assert_eq!(b.next(), Some(Outbound::Text(r#"{"type":"PING_APP"}"#.into())));
    }

    #[tokio::test]
    async fn closed_transport_is_removed_on_relay() {
        let (mut coordinator, _) = coordinator();
        let a = join(&mut coordinator, 1);
        let b = join(&mut coordinator, 2);
        drop(b);

        coordinator.on_message(a.id, r#"{"type":"X"}"#);
        assert_eq!(coordinator.connections(), vec![a.id]);
    }

    #[tokio::test]
    async fn disconnect_and_error_remove() {
        let (mut coordinator, _) = coordinator();
        let a = join(&mut coordinator, 1);
        let b = join(&mut coordinator, 2);

        coordinator.on_disconnect(a.id);
        coordinator.on_error(b.id, "connection reset");
        assert!(coordinator.connections().is_empty());

        // Late frames from a removed connection are ignored.
        coordinator.on_message(a.id, r#"{"type":"X"}"#);
        assert_eq!(coordinator.stats().relayed, 0);
    }
}
