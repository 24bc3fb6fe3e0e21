//! ag-gateway: authgate main binary
//!
//! Main entry point for the authgate service.
//!
//! Usage:
//!   ag-gateway           - Start the HTTP API server
//!   ag-gateway --help    - Show help
//!   ag-gateway --version - Show version

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use ag_auth::{AuthRunner, FormSelectors, StrategyFactory};
use ag_browser::{
    ChromeDriverFactory, ChromeOptions, ClickEffect, DriverFactory, MockDriverFactory, MockScript,
};
use ag_core::{Config, SessionStore};

/// Run mode
enum RunMode {
    /// Server mode (HTTP API)
    Server,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args() {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("ag-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting ag-gateway...");
    tracing::info!("Target origin: {}", config.base_url);

    let factory = StrategyFactory::with_defaults(&config);
    tracing::info!("Registered flows: {:?}", factory.flows());

    let store = Arc::new(SessionStore::new());
    let drivers = driver_factory(&config);
    let runner = Arc::new(AuthRunner::new(
        Arc::new(factory),
        Arc::clone(&store),
        drivers,
        &config,
    ));

    ag_api::start_server(config, runner, store).await
}

/// Pick the browser backend
///
/// `AUTHGATE_MOCK_BROWSER=true` swaps in the scripted mock driver so
/// the service can be exercised without a Chrome installation.
fn driver_factory(config: &Config) -> Arc<dyn DriverFactory> {
    let use_mock = std::env::var("AUTHGATE_MOCK_BROWSER")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);

    if use_mock {
        tracing::warn!("AUTHGATE_MOCK_BROWSER is set; logins run against the scripted mock");
        return Arc::new(mock_driver_factory(config));
    }

    let mut options = ChromeOptions::builder()
        .headless(config.headless)
        .window_size(config.browser.width, config.browser.height)
        .element_timeout(config.op_timeout());
    if let Some(ua) = &config.browser.user_agent {
        options = options.user_agent(ua.clone());
    }

    Arc::new(ChromeDriverFactory::new(options.build()))
}

/// Scripted stand-in for the form-login flow
///
/// Accepts any non-empty secret and issues a fixed session cookie.
fn mock_driver_factory(config: &Config) -> MockDriverFactory {
    let selectors = FormSelectors::default();
    let login_url = format!(
        "{}{}",
        config.base_url.trim_end_matches('/'),
        selectors.login_path
    );

    let script = MockScript::new()
        .page(
            login_url,
            [
                selectors.identifier.clone(),
                selectors.secret.clone(),
                selectors.submit.clone(),
            ],
        )
        .on_click(
            selectors.submit.clone(),
            ClickEffect::new()
                .require_nonempty(selectors.secret.clone())
                .show(selectors.dashboard_marker.clone())
                .cookie("session_id", "mock-session-token", "localhost")
                .otherwise_show(selectors.error_banner.clone()),
        );

    MockDriverFactory::new(script)
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    let args: Vec<String> = std::env::args().collect();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("ag-gateway - browser-driven authentication gateway");
    println!();
    println!("Usage:");
    println!("  ag-gateway           Start the HTTP API server");
    println!("  ag-gateway --help    Show this help message");
    println!("  ag-gateway --version Show version");
    println!();
    println!("Environment Variables:");
    println!("  BASE_URL               Target site origin");
    println!("  TIMEOUT_MS             Per-operation browser timeout (default: 30000)");
    println!("  HEADLESS               Run the browser without a window (default: true)");
    println!("  SESSION_TTL_SECS       Session artifact lifetime (default: 3600)");
    println!("  API_PORT               HTTP API port (default: 3000)");
    println!("  API_KEY                Bearer key guarding the API (open when unset)");
    println!("  OAUTH_CLIENT_ID        OAuth client id for the token-login flow");
    println!("  OAUTH_CLIENT_SECRET    OAuth client secret");
    println!("  OAUTH_REDIRECT_URI     OAuth redirect URI");
    println!("  AUTHGATE_MOCK_BROWSER  Use the scripted mock driver (default: false)");
}
