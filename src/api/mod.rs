//! HTTP and WebSocket server for the monitor
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Monitor** aggregate shared as router state
//! - **WebSocket** viewers registered as broadcaster subscribers
//!
//! ## Endpoints
//!
//! - `GET /` - Dashboard page
//! - `GET /api/results` - Latest outcome per target
//! - `GET /api/summary` - Dashboard summary
//! - `GET /api/targets/:key` - One target's summary and latest outcome
//! - `GET /api/health` - Health check
//! - `WS /ws` - Real-time outcome and summary streaming

pub mod error;
pub mod routes;
pub mod state;
pub mod types;
pub mod websocket;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{HealthResponse, TargetDetail};

use std::net::SocketAddr;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Enable CORS for dashboards served elsewhere
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(crate::util::get_addr(), crate::util::get_port()),
            enable_cors: true,
        }
    }
}

/// Build the router with all routes
pub fn router(state: ApiState, enable_cors: bool) -> Router {
    let app = Router::new()
        .route("/", get(routes::dashboard::index))
        .route("/api/results", get(routes::results::get_results))
        .route("/api/summary", get(routes::results::get_summary))
        .route("/api/targets/:key", get(routes::targets::get_target))
        .route("/api/health", get(routes::health::health_check))
        .route("/ws", get(websocket::websocket_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    }
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state, config.enable_cors);

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
