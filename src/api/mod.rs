//! REST API and WebSocket server for the heatwatch hub
//!
//! Read-only query surface consumed by the map dashboard, plus the live
//! push feed.
//!
//! ## Endpoints
//!
//! - `GET /api/v1/points` - Monitored point catalog (`?scope=all|base`)
//! - `GET /api/v1/events/recent` - Stored events, newest first
//! - `GET /api/v1/events/by-point` - Newest event for one point
//! - `GET /api/v1/health` - Uptime, subscriber and event counts
//! - `WS /api/v1/stream` - Live heat-event feed

pub mod error;
pub mod routes;
pub mod state;
pub mod websocket;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:4000")
    pub bind_addr: SocketAddr,

    /// Enable CORS for the dashboard
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4000".parse().expect("valid default bind addr"),
            enable_cors: true,
        }
    }
}

/// Spawn the API server.
///
/// Starts an Axum HTTP server in a background task and returns the server's
/// local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    info!("starting API server on {}", config.bind_addr);

    let mut app = Router::new()
        .route("/api/v1/points", get(routes::points::list_points))
        .route("/api/v1/events/recent", get(routes::events::recent_events))
        .route("/api/v1/events/by-point", get(routes::events::event_by_point))
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/stream", get(websocket::websocket_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
