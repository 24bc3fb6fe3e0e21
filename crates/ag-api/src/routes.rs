//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::handlers::{delete_session, flows, health, login, session_info};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Supported flows
        .route("/flows", get(flows))
        // Authentication
        .route("/auth/login", post(login))
        // Session management
        .route("/session/{session_id}", get(session_info))
        .route("/session/{session_id}", delete(delete_session))
}
