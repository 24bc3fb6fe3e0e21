//! HTTP API handlers
//!
//! Thin request/response mapping over the auth runner and the session
//! store. Nothing internal crosses this boundary: responses carry the
//! artifact's outcome, token, expiry, and reason string only.

use std::time::Instant;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use ag_core::{Credentials, Outcome, SessionArtifact};

use crate::server::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Flow identifier (e.g. "form-login")
    pub flow: String,
    /// Account identifier
    pub identifier: String,
    /// Account secret
    pub secret: String,
    /// Optional second-factor code
    pub second_factor: Option<String>,
}

/// Login response payload, mapped 1:1 from the session artifact
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub execution_time_ms: f64,
}

impl LoginResponse {
    fn from_artifact(artifact: &SessionArtifact, execution_time_ms: f64) -> Self {
        match artifact.outcome {
            Outcome::Success => Self {
                outcome: Outcome::Success,
                session_id: Some(artifact.id.clone()),
                token: artifact.token.clone(),
                expires_at: Some(artifact.expires_at),
                reason: None,
                execution_time_ms,
            },
            Outcome::Failure => Self {
                outcome: Outcome::Failure,
                session_id: None,
                token: None,
                expires_at: None,
                reason: artifact.reason.clone(),
                execution_time_ms,
            },
        }
    }
}

/// Supported flows response
#[derive(Debug, Serialize)]
pub struct FlowsResponse {
    pub flows: Vec<String>,
}

/// Generic API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// List the registered authentication flows
pub async fn flows(State(state): State<AppState>) -> Json<FlowsResponse> {
    Json(FlowsResponse {
        flows: state.runner.flows(),
    })
}

/// Run an authentication flow
///
/// 200 for a successful login, 401 for a failed one, 400 for an
/// unsupported flow identifier.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), (StatusCode, Json<ErrorResponse>)> {
    debug!("Login request for flow: {}", req.flow);
    let started = Instant::now();

    let mut credentials = Credentials::new(req.identifier, req.secret);
    if let Some(code) = req.second_factor {
        credentials = credentials.with_second_factor(code);
    }

    match state.runner.run(&req.flow, &credentials).await {
        Ok(artifact) => {
            let execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;
            let status = match artifact.outcome {
                Outcome::Success => StatusCode::OK,
                Outcome::Failure => StatusCode::UNAUTHORIZED,
            };
            info!(
                "Login via {} finished: {:?} ({:.0}ms)",
                artifact.flow, artifact.outcome, execution_time_ms
            );
            Ok((
                status,
                Json(LoginResponse::from_artifact(&artifact, execution_time_ms)),
            ))
        }
        Err(ag_core::Error::UnsupportedFlow(flow)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Unsupported flow: {}", flow),
            }),
        )),
        Err(e) => {
            error!("Login run failed unexpectedly: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal error".to_string(),
                }),
            ))
        }
    }
}

/// Fetch a stored session artifact
///
/// Expired sessions are indistinguishable from absent ones.
pub async fn session_info(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionArtifact>, (StatusCode, Json<ErrorResponse>)> {
    debug!("Session info request: {}", session_id);

    match state.store.get(&session_id) {
        Some(artifact) => Ok(Json(artifact)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Session not found".to_string(),
            }),
        )),
    }
}

/// Delete a stored session artifact
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    info!("Deleting session: {}", session_id);

    if state.store.delete(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Session not found".to_string(),
            }),
        ))
    }
}
