//! Server lifecycle.

use crate::config::ServerConfig;
use crate::coordinator::Coordinator;
use crate::error::{ServerError, ServerResult};
use crate::handle::CoordinatorHandle;
use crate::http;
use crate::persister::{best_effort, Persister};
use std::net::SocketAddr;
use std::sync::Arc;
use syncboard_protocol::ApplicationState;
use syncboard_store::{FileBackend, StateStore};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The sync server.
///
/// Owns the state store until [`start`](Self::start) wires it to a
/// coordinator, a snapshot writer and a TCP listener.
///
/// # Example
///
/// ```no_run
/// use syncboard_protocol::seed;
/// use syncboard_server::{ServerConfig, SyncServer};
///
/// # async fn demo() -> syncboard_server::ServerResult<()> {
/// let server = SyncServer::new(ServerConfig::default(), seed::default_board());
/// let running = server.start().await?;
/// running.close();
/// running.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct SyncServer {
    config: ServerConfig,
    store: Arc<StateStore>,
}

impl SyncServer {
    /// Creates a server persisting to `config.state_path`, seeded with `seed`
    /// when no snapshot exists.
    pub fn new(config: ServerConfig, seed: ApplicationState) -> Self {
        let backend = Arc::new(FileBackend::new(config.state_path.clone()));
        Self::with_store(config, Arc::new(StateStore::new(backend, seed)))
    }

    /// Creates a server over an existing store.
    pub fn with_store(config: ServerConfig, store: Arc<StateStore>) -> Self {
        Self { config, store }
    }

    /// Returns the state store.
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Loads (or seeds) the state, then starts accepting connections.
    ///
    /// A store that cannot be initialized is not fatal: the server runs on
    /// the in-memory state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the listener
    /// cannot be bound.
    pub async fn start(self) -> ServerResult<RunningServer> {
        self.config.validate()?;

        if let Some(source) = best_effort("initialize store", self.store.initialize().await) {
            info!(?source, location = %self.store.location(), "state ready");
        }

        let (persister, writer) = Persister::spawn(Arc::clone(&self.store));
        let (coordinator, coordinator_task) = Coordinator::new(Arc::clone(&self.store), persister)
            .spawn(self.config.heartbeat_interval);
        let app = http::router(coordinator.clone(), &self.config)?;

        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let serve = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
        });
        info!(addr = %local_addr, "server listening");

        Ok(RunningServer {
            local_addr,
            coordinator,
            shutdown,
            serve,
            coordinator_task,
            writer,
        })
    }
}

/// A started server.
pub struct RunningServer {
    local_addr: SocketAddr,
    coordinator: CoordinatorHandle,
    shutdown: CancellationToken,
    serve: JoinHandle<std::io::Result<()>>,
    coordinator_task: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl RunningServer {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle to the coordinator.
    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.coordinator
    }

    /// Stops the liveness timer and closes the listener.
    ///
    /// Connections are not closed one by one; they end when the coordinator
    /// drops their outbound queues. Pending snapshot writes still complete.
    pub fn close(&self) {
        info!("closing server");
        self.coordinator.shutdown();
        self.shutdown.cancel();
    }

    /// Waits for the listener, the coordinator and the snapshot writer to
    /// finish. Call [`close`](Self::close) first.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener failed or a task panicked.
    pub async fn wait(self) -> ServerResult<()> {
        let served = self.serve.await.map_err(|e| ServerError::Internal(e.to_string()))?;
        self.coordinator_task
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        self.writer
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        info!("server closed");
        served.map_err(ServerError::from)
    }
}
