//! Authentication runner
//!
//! Orchestrates one run: resolve the strategy, acquire a browser
//! session, execute, normalize the result into a `SessionArtifact`,
//! release the session on every path, persist, return. No retries:
//! repeated credential submission can trigger account lockouts, so a
//! failed attempt is reported, not replayed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use ag_browser::{BrowserSession, DriverFactory};
use ag_core::{Config, Credentials, Error, Result, SessionArtifact, SessionStore};

use crate::factory::StrategyFactory;
use crate::strategy::Attempt;

/// Drives authentication runs end to end
pub struct AuthRunner {
    factory: Arc<StrategyFactory>,
    store: Arc<SessionStore>,
    drivers: Arc<dyn DriverFactory>,
    op_timeout: Duration,
    session_ttl_secs: i64,
}

impl AuthRunner {
    pub fn new(
        factory: Arc<StrategyFactory>,
        store: Arc<SessionStore>,
        drivers: Arc<dyn DriverFactory>,
        config: &Config,
    ) -> Self {
        Self {
            factory,
            store,
            drivers,
            op_timeout: config.op_timeout(),
            session_ttl_secs: config.session_ttl_secs,
        }
    }

    /// Registered flow identifiers
    pub fn flows(&self) -> Vec<String> {
        self.factory.flows()
    }

    /// Execute one authentication run
    ///
    /// `UnsupportedFlow` is the only error return, raised before any
    /// browser resource is acquired. Everything after that point is
    /// normalized into the returned artifact.
    pub async fn run(&self, flow_id: &str, credentials: &Credentials) -> Result<SessionArtifact> {
        // Validate the flow before opening a browser; an unknown flow
        // must not cost a browser launch.
        let strategy = self.factory.resolve(flow_id)?;

        info!(
            "Starting {} run for {}",
            flow_id, credentials.identifier
        );
        let started = Instant::now();

        let attempt = match self.drivers.launch().await {
            Ok(driver) => {
                let mut session = BrowserSession::with_timeout(driver, self.op_timeout);
                let result = strategy.execute(&mut session, credentials).await;

                // Release the session on every path before looking at
                // the result.
                if let Err(e) = session.close().await {
                    warn!("Failed to close browser session: {}", e);
                }

                match result {
                    Ok(attempt) => attempt,
                    Err(Error::OperationTimeout(msg)) => {
                        warn!("{} run timed out: {}", flow_id, msg);
                        Attempt::failure("OperationTimeout")
                    }
                    Err(e) => {
                        error!("Unclassified error in {} run: {}", flow_id, e);
                        Attempt::failure("InternalError")
                    }
                }
            }
            Err(e) => {
                error!("Browser launch failed: {}", e);
                Attempt::failure("browser unavailable")
            }
        };

        let artifact = match attempt {
            Attempt::Success {
                token,
                cookies,
                oauth_tokens,
            } => {
                let mut artifact = SessionArtifact::success(flow_id, token, self.session_ttl_secs)
                    .with_cookies(cookies);
                if let Some(tokens) = oauth_tokens {
                    artifact = artifact.with_oauth_tokens(tokens);
                }
                artifact
            }
            Attempt::Failure { reason } => SessionArtifact::failure(flow_id, reason),
        };

        info!(
            "{} run finished in {:?} (outcome: {:?})",
            flow_id,
            started.elapsed(),
            artifact.outcome
        );

        self.store.put(artifact.clone());
        Ok(artifact)
    }
}
