//! Captcha detection hook
//!
//! Strategies check for a challenge between filling credentials and
//! submitting. The default solver only detects; a run that hits a live
//! challenge fails with a clear reason instead of hanging on it.

use async_trait::async_trait;
use tracing::{debug, warn};

use ag_browser::BrowserSession;

/// Default selector covering the common embedded-challenge markup
pub const DEFAULT_CHALLENGE_SELECTOR: &str = "iframe[src*='captcha']";

/// Pluggable captcha handling
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    fn name(&self) -> &str;

    /// Whether a challenge is currently present on the page
    async fn detect(&self, session: &mut BrowserSession) -> ag_browser::Result<bool>;

    /// Attempt to clear the challenge; returns whether it was cleared
    async fn solve(&self, session: &mut BrowserSession) -> ag_browser::Result<bool>;
}

/// Detector-only solver
///
/// Reports challenges but never clears them; the strategy turns an
/// unsolved challenge into a failed attempt.
pub struct NoopSolver {
    challenge_selector: String,
}

impl NoopSolver {
    pub fn new() -> Self {
        Self {
            challenge_selector: DEFAULT_CHALLENGE_SELECTOR.to_string(),
        }
    }

    pub fn with_selector(selector: impl Into<String>) -> Self {
        Self {
            challenge_selector: selector.into(),
        }
    }
}

impl Default for NoopSolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptchaSolver for NoopSolver {
    fn name(&self) -> &str {
        "noop"
    }

    async fn detect(&self, session: &mut BrowserSession) -> ag_browser::Result<bool> {
        let present = session.is_visible(&self.challenge_selector).await?;
        if present {
            debug!("Captcha challenge detected ({})", self.challenge_selector);
        }
        Ok(present)
    }

    async fn solve(&self, _session: &mut BrowserSession) -> ag_browser::Result<bool> {
        warn!("Captcha challenge present but no solver is configured");
        Ok(false)
    }
}
