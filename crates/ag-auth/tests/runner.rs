//! End-to-end runner tests over the scripted mock driver

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use ag_auth::{
    AuthRunner, CodeExchange, StrategyFactory, TokenExchanger, TokenLoginStrategy,
};
use ag_browser::{ClickEffect, MockDriverFactory, MockScript};
use ag_core::{
    Config, Credentials, OAuthTokens, OauthConfig, Outcome, SessionStore,
};

const BASE_URL: &str = "https://site.test";

fn test_config() -> Config {
    Config {
        base_url: BASE_URL.to_string(),
        ..Default::default()
    }
}

/// Script for the default form-login selectors: correct password lands
/// on the dashboard with a session cookie, anything else raises the
/// error banner.
fn form_login_script() -> MockScript {
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
                .cookie("session_id", "sess-abc123", "site.test")
                .otherwise_show(".alert-error"),
        )
}

fn runner_with(
    config: &Config,
    factory: StrategyFactory,
    drivers: MockDriverFactory,
) -> (AuthRunner, Arc<SessionStore>, ag_browser::DriverSpy) {
    let store = Arc::new(SessionStore::new());
    let spy = drivers.spy();
    let runner = AuthRunner::new(
        Arc::new(factory),
        Arc::clone(&store),
        Arc::new(drivers),
        config,
    );
    (runner, store, spy)
}

#[tokio::test]
async fn form_login_with_valid_credentials_succeeds() {
    let config = test_config();
    let factory = StrategyFactory::with_defaults(&config);
    let (runner, store, spy) = runner_with(
        &config,
        factory,
        MockDriverFactory::new(form_login_script()),
    );

    let credentials = Credentials::new("user@site.test", "hunter2");
    let artifact = runner.run("form-login", &credentials).await.unwrap();

    assert_eq!(artifact.outcome, Outcome::Success);
    assert!(artifact.is_valid());
    assert_eq!(artifact.token.as_deref(), Some("sess-abc123"));
    assert!(artifact.reason.is_none());
    assert_eq!(
        artifact.expires_at - artifact.created_at,
        chrono::Duration::seconds(3600)
    );
    assert_eq!(artifact.cookies.len(), 1);

    // One browser, opened and closed exactly once, artifact persisted.
    assert_eq!(spy.launches(), 1);
    assert_eq!(spy.closes(), 1);
    assert!(store.get(&artifact.id).is_some());
}

#[tokio::test]
async fn form_login_with_wrong_secret_fails() {
    let config = test_config();
    let factory = StrategyFactory::with_defaults(&config);
    let (runner, store, spy) = runner_with(
        &config,
        factory,
        MockDriverFactory::new(form_login_script()),
    );

    let credentials = Credentials::new("user@site.test", "wrong-password");
    let artifact = runner.run("form-login", &credentials).await.unwrap();

    assert_eq!(artifact.outcome, Outcome::Failure);
    assert!(artifact.is_valid());
    assert_eq!(artifact.reason.as_deref(), Some("invalid credentials"));
    assert!(artifact.token.is_none());

    assert_eq!(spy.launches(), 1);
    assert_eq!(spy.closes(), 1);
    // Failure artifacts are stored but expire immediately.
    assert!(store.get(&artifact.id).is_none());
}

#[tokio::test]
async fn unsupported_flow_fails_before_browser_launch() {
    let config = test_config();
    let factory = StrategyFactory::with_defaults(&config);
    let (runner, _store, spy) = runner_with(
        &config,
        factory,
        MockDriverFactory::new(form_login_script()),
    );

    let credentials = Credentials::new("user@site.test", "hunter2");
    let err = runner.run("nonexistent", &credentials).await.unwrap_err();

    assert!(matches!(err, ag_core::Error::UnsupportedFlow(_)));
    assert_eq!(spy.launches(), 0);
    assert_eq!(spy.closes(), 0);
}

#[tokio::test]
async fn stalled_dashboard_wait_times_out_and_still_closes() {
    let config = Config {
        timeout_ms: 100,
        ..test_config()
    };
    let factory = StrategyFactory::with_defaults(&config);

    // The dashboard never renders in time; wait_for stalls past the
    // 100ms operation timeout.
    let script = form_login_script().delay("[data-qa='dashboard']", Duration::from_secs(60));
    let (runner, _store, spy) = runner_with(&config, factory, MockDriverFactory::new(script));

    let credentials = Credentials::new("user@site.test", "hunter2");
    let artifact = runner.run("form-login", &credentials).await.unwrap();

    assert_eq!(artifact.outcome, Outcome::Failure);
    assert_eq!(artifact.reason.as_deref(), Some("OperationTimeout"));
    assert_eq!(spy.launches(), 1);
    assert_eq!(spy.closes(), 1);
}

#[tokio::test]
async fn quiet_page_without_dashboard_is_not_a_success() {
    let config = test_config();
    let factory = StrategyFactory::with_defaults(&config);

    // Submission is accepted (no error banner) but no dashboard marker
    // ever appears.
    let script = MockScript::new()
        .page(
            "https://site.test/login",
            [
                "input[type='email']",
                "input[type='password']",
                "button[type='submit']",
            ],
        )
        .on_click("button[type='submit']", ClickEffect::new());
    let (runner, _store, spy) = runner_with(&config, factory, MockDriverFactory::new(script));

    let credentials = Credentials::new("user@site.test", "hunter2");
    let artifact = runner.run("form-login", &credentials).await.unwrap();

    assert_eq!(artifact.outcome, Outcome::Failure);
    assert_eq!(artifact.reason.as_deref(), Some("login not confirmed"));
    assert_eq!(spy.closes(), 1);
}

#[tokio::test]
async fn browser_launch_failure_is_normalized() {
    let config = test_config();
    let factory = StrategyFactory::with_defaults(&config);
    let (runner, _store, spy) = runner_with(
        &config,
        factory,
        MockDriverFactory::new(form_login_script()).failing(),
    );

    let credentials = Credentials::new("user@site.test", "hunter2");
    let artifact = runner.run("form-login", &credentials).await.unwrap();

    assert_eq!(artifact.outcome, Outcome::Failure);
    assert_eq!(artifact.reason.as_deref(), Some("browser unavailable"));
    assert_eq!(spy.launches(), 0);
}

// ============================================================================
// mfa-login
// ============================================================================

fn mfa_script() -> MockScript {
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
                .show("input[autocomplete='one-time-code']")
                .show("button[data-qa='verify']")
                .otherwise_show(".alert-error"),
        )
        .on_click(
            "button[data-qa='verify']",
            ClickEffect::new()
                .require_fill("input[autocomplete='one-time-code']", "654321")
                .show("[data-qa='dashboard']")
                .hide("input[autocomplete='one-time-code']")
                .cookie("auth_token", "mfa-sess-1", "site.test")
                .otherwise_show(".alert-error"),
        )
}

#[tokio::test]
async fn mfa_login_with_code_succeeds() {
    let config = test_config();
    let factory = StrategyFactory::with_defaults(&config);
    let (runner, _store, spy) = runner_with(&config, factory, MockDriverFactory::new(mfa_script()));

    let credentials = Credentials::new("user@site.test", "hunter2").with_second_factor("654321");
    let artifact = runner.run("mfa-login", &credentials).await.unwrap();

    assert_eq!(artifact.outcome, Outcome::Success);
    assert_eq!(artifact.token.as_deref(), Some("mfa-sess-1"));
    assert_eq!(spy.closes(), 1);
}

#[tokio::test]
async fn mfa_login_without_code_fails() {
    let config = test_config();
    let factory = StrategyFactory::with_defaults(&config);
    let (runner, _store, spy) = runner_with(&config, factory, MockDriverFactory::new(mfa_script()));

    let credentials = Credentials::new("user@site.test", "hunter2");
    let artifact = runner.run("mfa-login", &credentials).await.unwrap();

    assert_eq!(artifact.outcome, Outcome::Failure);
    assert_eq!(artifact.reason.as_deref(), Some("second factor required"));
    assert_eq!(spy.closes(), 1);
}

#[tokio::test]
async fn mfa_login_with_wrong_code_fails() {
    let config = test_config();
    let factory = StrategyFactory::with_defaults(&config);
    let (runner, _store, _spy) =
        runner_with(&config, factory, MockDriverFactory::new(mfa_script()));

    let credentials = Credentials::new("user@site.test", "hunter2").with_second_factor("000000");
    let artifact = runner.run("mfa-login", &credentials).await.unwrap();

    assert_eq!(artifact.outcome, Outcome::Failure);
    assert_eq!(artifact.reason.as_deref(), Some("invalid second factor"));
}

// ============================================================================
// token-login
// ============================================================================

/// Records exchange requests and returns a fixed token set
struct StaticExchanger {
    seen: Mutex<Vec<CodeExchange>>,
}

impl StaticExchanger {
    fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TokenExchanger for StaticExchanger {
    async fn exchange(&self, request: &CodeExchange) -> ag_core::Result<OAuthTokens> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(OAuthTokens {
            access_token: Some("at-456".to_string()),
            refresh_token: Some("rt-789".to_string()),
            token_type: Some("bearer".to_string()),
            expires_in: Some(3600),
        })
    }
}

fn token_script() -> MockScript {
    MockScript::new()
        .page(
            "https://site.test/oauth/authorize",
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
                .goto("http://localhost:3000/callback?code=code-123&state=xyz")
                .otherwise_show(".alert-error"),
        )
}

fn oauth_config() -> OauthConfig {
    OauthConfig {
        client_id: Some("client-1".to_string()),
        client_secret: Some("shh".to_string()),
        redirect_uri: Some("http://localhost:3000/callback".to_string()),
        authorize_path: None,
        token_url: Some("https://site.test/oauth/token".to_string()),
    }
}

#[tokio::test]
async fn token_login_exchanges_redirect_code() {
    let config = Config {
        oauth: oauth_config(),
        ..test_config()
    };

    let exchanger = Arc::new(StaticExchanger::new());
    let mut factory = StrategyFactory::new();
    factory.register(Arc::new(
        TokenLoginStrategy::new(BASE_URL, config.oauth.clone())
            .with_exchanger(Arc::clone(&exchanger) as Arc<dyn TokenExchanger>),
    ));

    let (runner, _store, spy) =
        runner_with(&config, factory, MockDriverFactory::new(token_script()));

    let credentials = Credentials::new("user@site.test", "hunter2");
    let artifact = runner.run("token-login", &credentials).await.unwrap();

    assert_eq!(artifact.outcome, Outcome::Success);
    assert_eq!(artifact.token.as_deref(), Some("at-456"));
    let tokens = artifact.oauth_tokens.as_ref().unwrap();
    assert_eq!(tokens.refresh_token.as_deref(), Some("rt-789"));

    let seen = exchanger.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].code, "code-123");
    assert_eq!(seen[0].client_id, "client-1");

    assert_eq!(spy.launches(), 1);
    assert_eq!(spy.closes(), 1);
}

#[tokio::test]
async fn token_login_with_wrong_secret_fails_before_exchange() {
    let config = Config {
        oauth: oauth_config(),
        ..test_config()
    };

    let exchanger = Arc::new(StaticExchanger::new());
    let mut factory = StrategyFactory::new();
    factory.register(Arc::new(
        TokenLoginStrategy::new(BASE_URL, config.oauth.clone())
            .with_exchanger(Arc::clone(&exchanger) as Arc<dyn TokenExchanger>),
    ));

    let (runner, _store, _spy) =
        runner_with(&config, factory, MockDriverFactory::new(token_script()));

    let credentials = Credentials::new("user@site.test", "wrong");
    let artifact = runner.run("token-login", &credentials).await.unwrap();

    assert_eq!(artifact.outcome, Outcome::Failure);
    assert_eq!(artifact.reason.as_deref(), Some("invalid credentials"));
    assert!(exchanger.seen.lock().unwrap().is_empty());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn concurrent_runs_each_own_a_session() {
    let config = test_config();
    let factory = StrategyFactory::with_defaults(&config);
    let store = Arc::new(SessionStore::new());
    let drivers = MockDriverFactory::new(form_login_script());
    let spy = drivers.spy();
    let runner = Arc::new(AuthRunner::new(
        Arc::new(factory),
        Arc::clone(&store),
        Arc::new(drivers),
        &config,
    ));

    let mut handles = Vec::new();
    for i in 0..4 {
        let runner = Arc::clone(&runner);
        handles.push(tokio::spawn(async move {
            let credentials = Credentials::new(format!("user{}@site.test", i), "hunter2");
            runner.run("form-login", &credentials).await.unwrap()
        }));
    }

    for handle in handles {
        let artifact = handle.await.unwrap();
        assert_eq!(artifact.outcome, Outcome::Success);
    }

    assert_eq!(spy.launches(), 4);
    assert_eq!(spy.closes(), 4);
    assert_eq!(store.len(), 4);
}
