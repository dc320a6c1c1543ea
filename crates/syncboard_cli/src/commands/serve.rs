//! Serve command implementation.

use super::CliError;
use clap::Args;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use syncboard_protocol::ApplicationState;
use syncboard_server::{ServerConfig, SyncServer};
use tracing::info;

/// Options for `syncboard serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Allowed cross-origin for browsers
    #[arg(long, env = "CLIENT_URL", default_value = "http://localhost:5173")]
    pub origin: String,

    /// Snapshot file
    #[arg(short, long, env = "SYNCBOARD_DATA", default_value = "data/state.json")]
    pub data: PathBuf,

    /// Seconds between liveness sweeps
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    pub heartbeat_secs: u64,

    /// JSON board used when no snapshot exists
    #[arg(long)]
    pub seed: Option<PathBuf>,
}

impl ServeArgs {
    /// Builds the server configuration.
    pub fn config(&self) -> ServerConfig {
        ServerConfig::new(SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port)))
            .with_allowed_origin(self.origin.clone())
            .with_heartbeat_interval(Duration::from_secs(self.heartbeat_secs))
            .with_state_path(self.data.clone())
    }
}

/// Runs the server until Ctrl-C or SIGTERM.
pub async fn run(config: ServerConfig, seed: ApplicationState) -> Result<(), CliError> {
    let server = SyncServer::new(config, seed).start().await?;
    info!(addr = %server.local_addr(), "syncboard running");

    shutdown_signal().await?;
    server.close();
    server.wait().await?;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = terminate.recv() => info!("received SIGTERM"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
