//! HTTP API Server
//!
//! Starts and manages the axum-based HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ag_auth::AuthRunner;
use ag_core::{Config, SessionStore};

use crate::middleware::auth_middleware;
use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub runner: Arc<AuthRunner>,
    pub store: Arc<SessionStore>,
}

/// Build the application router
///
/// Split out from `start_server` so tests can drive the router
/// directly.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new().merge(routes());

    if state.config.api.key.is_some() {
        router = router.route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));
    }

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP API server
pub async fn start_server(
    config: Config,
    runner: Arc<AuthRunner>,
    store: Arc<SessionStore>,
) -> anyhow::Result<()> {
    let port = config.api.port;
    let state = AppState {
        config,
        runner,
        store,
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
