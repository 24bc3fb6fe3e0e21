//! Authentication middleware
//!
//! Bearer API-key authentication for the whole API surface. Applied
//! only when a key is configured; without one, the API is open (for
//! development and testing).

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};

use crate::server::AppState;

/// API key authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if validate_api_key(provided, state.config.api.key.as_deref()) {
        Ok(next.run(request).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

/// Simple API key validation
pub fn validate_api_key(provided: Option<&str>, expected: Option<&str>) -> bool {
    match (provided, expected) {
        (Some(p), Some(e)) => p == e,
        (_, None) => true,        // No key configured, allow
        (None, Some(_)) => false, // Key required but not provided
    }
}
