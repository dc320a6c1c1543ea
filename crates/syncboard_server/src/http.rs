//! HTTP routes.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handle::CoordinatorHandle;
use crate::ws;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;

/// Path of the health check.
pub const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Builds the service router: health check, WebSocket upgrade on `/` and
/// `/ws`, and CORS for the configured origin.
///
/// # Errors
///
/// Returns [`ServerError::InvalidConfig`] if the allowed origin is not a
/// valid header value.
pub fn router(coordinator: CoordinatorHandle, config: &ServerConfig) -> ServerResult<Router> {
    Ok(Router::new()
        .route(HEALTH_PATH, get(health))
        .route("/", get(ws::upgrade))
        .route("/ws", get(ws::upgrade))
        .layer(cors(&config.allowed_origin)?)
        .with_state(coordinator))
}

fn cors(origin: &str) -> ServerResult<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .map_err(|_| ServerError::InvalidConfig(format!("invalid allowed origin: {origin:?}")))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true))
}
