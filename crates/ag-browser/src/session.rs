//! Browser session management
//!
//! `BrowserSession` owns exactly one page driver for the duration of an
//! authentication run. Every operation runs under the configured
//! per-operation timeout; an elapsed timer surfaces as
//! `BrowserError::Timeout`. No operation is retried here; retry policy
//! belongs to the caller.

use std::time::Duration;

use tracing::{debug, info, warn};

use ag_core::SessionCookie;

use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};

/// Default per-operation timeout
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(30);

/// One automated browser context, single-owner
///
/// Acquired at the start of a run and released exactly once on every
/// exit path via `close`.
pub struct BrowserSession {
    driver: Box<dyn PageDriver>,
    op_timeout: Duration,
    closed: bool,
}

impl BrowserSession {
    /// Take ownership of a driver with the default operation timeout
    pub fn open(driver: Box<dyn PageDriver>) -> Self {
        Self::with_timeout(driver, DEFAULT_OP_TIMEOUT)
    }

    /// Take ownership of a driver with a custom operation timeout
    pub fn with_timeout(driver: Box<dyn PageDriver>, op_timeout: Duration) -> Self {
        debug!("Browser session opened (op timeout: {:?})", op_timeout);
        Self {
            driver,
            op_timeout,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        Ok(())
    }

    async fn bounded<T>(
        timeout: Duration,
        what: &str,
        op: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(BrowserError::Timeout(format!(
                "{} exceeded {:?}",
                what, timeout
            ))),
        }
    }

    /// Navigate to a URL
    pub async fn navigate(&mut self, url: &str) -> Result<()> {
        self.ensure_open()?;
        Self::bounded(self.op_timeout, "navigate", self.driver.navigate(url)).await
    }

    /// Fill an input field
    pub async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        Self::bounded(self.op_timeout, "fill", self.driver.fill(selector, value)).await
    }

    /// Click an element
    pub async fn click(&mut self, selector: &str) -> Result<()> {
        self.ensure_open()?;
        Self::bounded(self.op_timeout, "click", self.driver.click(selector)).await
    }

    /// Wait for an element to appear
    pub async fn wait_for(&mut self, selector: &str) -> Result<()> {
        self.ensure_open()?;
        Self::bounded(self.op_timeout, "wait_for", self.driver.wait_for(selector)).await
    }

    /// Whether an element is currently present
    pub async fn is_visible(&mut self, selector: &str) -> Result<bool> {
        self.ensure_open()?;
        Self::bounded(
            self.op_timeout,
            "is_visible",
            self.driver.is_visible(selector),
        )
        .await
    }

    /// Current page URL
    pub async fn current_url(&mut self) -> Result<String> {
        self.ensure_open()?;
        Self::bounded(self.op_timeout, "current_url", self.driver.current_url()).await
    }

    /// Cookies visible to the current page
    pub async fn cookies(&mut self) -> Result<Vec<SessionCookie>> {
        self.ensure_open()?;
        Self::bounded(self.op_timeout, "cookies", self.driver.cookies()).await
    }

    /// Release the underlying browser
    ///
    /// Idempotent; must be called on every exit path.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        info!("Closing browser session");
        Self::bounded(self.op_timeout, "close", self.driver.close()).await
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.closed {
            // A cancelled run lands here; the driver's own Drop still
            // reclaims the browser process.
            warn!("Browser session dropped without close");
        }
    }
}
