//! Router-level API tests over the scripted mock driver

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use ag_api::{AppState, app};
use ag_auth::{AuthRunner, StrategyFactory};
use ag_browser::{ClickEffect, MockDriverFactory, MockScript};
use ag_core::{ApiConfig, Config, SessionStore};

fn form_script() -> MockScript {
    MockScript::new()
        .page(
            "https://site.test/login",
            [
                "input[type='email']",
                "input[type='password']",
                "button[type='submit']",
            ],
        )
        .on_click(
            "button[type='submit']",
            ClickEffect::new()
                .require_fill("input[type='password']", "hunter2")
                .show("[data-qa='dashboard']")
                .cookie("session_id", "sess-1", "site.test")
                .otherwise_show(".alert-error"),
        )
}

fn test_state(api_key: Option<&str>) -> AppState {
    let config = Config {
        base_url: "https://site.test".to_string(),
        api: ApiConfig {
            key: api_key.map(String::from),
            ..Default::default()
        },
        ..Default::default()
    };

    let factory = StrategyFactory::with_defaults(&config);
    let store = Arc::new(SessionStore::new());
    let runner = Arc::new(AuthRunner::new(
        Arc::new(factory),
        Arc::clone(&store),
        Arc::new(MockDriverFactory::new(form_script())),
        &config,
    ));

    AppState {
        config,
        runner,
        store,
    }
}

fn login_request(flow: &str, secret: &str) -> Request<Body> {
    let body = json!({
        "flow": flow,
        "identifier": "user@site.test",
        "secret": secret,
    });
    Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = app(test_state(None));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn flows_lists_registered_flows() {
    let app = app(test_state(None));

    let response = app
        .oneshot(Request::builder().uri("/flows").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let flows: Vec<&str> = body["flows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(flows, vec!["form-login", "mfa-login", "token-login"]);
}

#[tokio::test]
async fn successful_login_returns_200_with_token() {
    let app = app(test_state(None));

    let response = app.oneshot(login_request("form-login", "hunter2")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["outcome"], "success");
    assert_eq!(body["token"], "sess-1");
    assert!(body["session_id"].is_string());
    assert!(body["expires_at"].is_string());
    assert!(body.get("reason").is_none());
    assert!(body["execution_time_ms"].is_number());
}

#[tokio::test]
async fn failed_login_returns_401_with_reason() {
    let app = app(test_state(None));

    let response = app.oneshot(login_request("form-login", "wrong")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["outcome"], "failure");
    assert_eq!(body["reason"], "invalid credentials");
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn unsupported_flow_returns_400() {
    let app = app(test_state(None));

    let response = app.oneshot(login_request("nonexistent", "hunter2")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("nonexistent"));
}

#[tokio::test]
async fn session_lifecycle_over_http() {
    let state = test_state(None);

    // Login, then fetch and delete the stored session.
    let response = app(state.clone())
        .oneshot(login_request("form-login", "hunter2"))
        .await
        .unwrap();
    let session_id = body_json(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app(state.clone())
        .oneshot(
            Request::builder()
                .uri(format!("/session/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["flow"], "form-login");

    let response = app(state.clone())
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/session/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app(state)
        .oneshot(
            Request::builder()
                .uri(format!("/session/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_session_returns_404() {
    let app = app(test_state(None));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/session/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn configured_api_key_guards_requests() {
    let state = test_state(Some("secret-key"));

    let response = app(state.clone())
        .oneshot(Request::builder().uri("/flows").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(state)
        .oneshot(
            Request::builder()
                .uri("/flows")
                .header(header::AUTHORIZATION, "Bearer secret-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
