//! ag-api: HTTP API for authgate
//!
//! Thin REST layer over the auth runner and the session store.
//! Built with axum for async HTTP handling.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{AppState, app, start_server};
