//! Server configuration.

use crate::error::{ServerError, ServerResult};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default liveness sweep period.
pub const DEFAULT_HEARTBEAT: Duration = Duration::from_secs(30);

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Origin allowed to make cross-origin requests.
    pub allowed_origin: String,
    /// Period of the liveness sweep.
    pub heartbeat_interval: Duration,
    /// Location of the state snapshot file.
    pub state_path: PathBuf,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            allowed_origin: "http://localhost:5173".into(),
            heartbeat_interval: DEFAULT_HEARTBEAT,
            state_path: PathBuf::from("data").join("state.json"),
        }
    }

    /// Sets the allowed cross-origin.
    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = origin.into();
        self
    }

    /// Sets the liveness sweep period.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the snapshot file location.
    pub fn with_state_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_path = path.into();
        self
    }

    /// Checks values that would otherwise fail later at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidConfig`] for a zero heartbeat or an
    /// origin that is not a valid header value.
    pub fn validate(&self) -> ServerResult<()> {
        if self.heartbeat_interval.is_zero() {
            return Err(ServerError::InvalidConfig(
                "heartbeat interval must be non-zero".into(),
            ));
        }
        if self.allowed_origin.is_empty()
            || axum::http::HeaderValue::from_str(&self.allowed_origin).is_err()
        {
            return Err(ServerError::InvalidConfig(format!(
                "invalid allowed origin: {:?}",
                self.allowed_origin
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], 4000)))
    }
}
