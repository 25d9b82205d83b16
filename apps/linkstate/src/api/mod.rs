//! # Linkstate HTTP API Module
//!
//! The interactive control surface, using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Topology metrics
//! - `GET /topology` - Nodes and links
//! - `PUT /topology` - Replace the topology with a JSON document
//! - `POST /nodes` - Add a node
//! - `DELETE /nodes/{id}` - Remove a node and its links
//! - `POST /links` - Add a link
//! - `DELETE /links/{u}/{v}` - Remove a link
//! - `POST /links/status` - Jam (DOWN) or restore (UP) a link
//! - `POST /links/weight` - Set a link's measured cost
//! - `POST /recompute` - Recompute every routing table
//! - `GET /routes/{src}` - Cached routing table of one node
//! - `GET /routes/{src}/{dst}` - Shortest path between two nodes
//! - `GET /hysteresis`, `PUT /hysteresis` - Hysteresis settings
//! - `GET /hysteresis/{u}/{v}` - Filter state of one link
//! - `POST /export` - Route export document
//!
//! ## Configuration (Environment Variables)
//!
//! - `LINKSTATE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `linkstate::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    add_link_handler, add_node_handler, export_handler, get_hysteresis_handler, health_handler,
    link_hysteresis_handler, link_status_handler, link_weight_handler, load_topology_handler,
    path_handler,
    put_hysteresis_handler, recompute_handler, remove_link_handler, remove_node_handler,
    routes_handler, status_handler, topology_handler,
};
#[allow(unused_imports)]
pub use types::{
    AddLinkRequest, AddNodeRequest, AddNodeResponse, ErrorResponse, HealthResponse,
    HysteresisResponse, HysteresisUpdateRequest, LinkJson, LinkStateResponse, LinkStatusRequest,
    LinkWeightRequest, MutationResponse, NodeJson, PathResponse, RecomputeResponse,
    RouteTableResponse, StatusResponse, TopologyLoadResponse, TopologyResponse,
};

use crate::ticker::{MonotonicClock, spawn_ticker};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post},
};
use linkstate_core::{LinkStateError, Session};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the session.
#[derive(Clone)]
pub struct AppState {
    /// The session: graph, routing index and hysteresis controller.
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    /// Create new app state with a session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `LINKSTATE_CORS_ORIGINS`:
/// - If "*": allows all origins
/// - If not set: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("LINKSTATE_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (LINKSTATE_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in LINKSTATE_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                with_allowed_methods(CorsLayer::new().allow_origin(allowed_origins))
            }
        }
        None => {
            tracing::debug!("CORS: No LINKSTATE_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn with_allowed_methods(layer: CorsLayer) -> CorsLayer {
    layer
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    with_allowed_methods(CorsLayer::new().allow_origin(origins))
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/topology",
            get(handlers::topology_handler).put(handlers::load_topology_handler),
        )
        .route("/nodes", post(handlers::add_node_handler))
        .route("/nodes/{id}", delete(handlers::remove_node_handler))
        .route("/links", post(handlers::add_link_handler))
        .route("/links/{u}/{v}", delete(handlers::remove_link_handler))
        .route("/links/status", post(handlers::link_status_handler))
        .route("/links/weight", post(handlers::link_weight_handler))
        .route("/recompute", post(handlers::recompute_handler))
        .route("/routes/{src}", get(handlers::routes_handler))
        .route("/routes/{src}/{dst}", get(handlers::path_handler))
        .route(
            "/hysteresis",
            get(handlers::get_hysteresis_handler).put(handlers::put_hysteresis_handler),
        )
        .route("/hysteresis/{u}/{v}", get(handlers::link_hysteresis_handler))
        .route("/export", post(handlers::export_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and the background ticker; return on Ctrl+C.
pub async fn run_server(addr: &str, session: Session, tick_ms: u64) -> Result<(), LinkStateError> {
    let state = AppState::new(session);
    let ticker = spawn_ticker(Arc::clone(&state.session), MonotonicClock::start(), tick_ms);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| LinkStateError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!(addr, tick_ms, "linkstate HTTP server listening");

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LinkStateError::IoError(format!("Server error: {}", e)));

    ticker.abort();
    tracing::info!("linkstate HTTP server stopped");
    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
