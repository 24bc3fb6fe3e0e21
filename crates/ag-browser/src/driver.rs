//! Page driver abstraction
//!
//! The capability set the authentication core consumes. Strategies see
//! nothing of the underlying automation engine; any driver exposing
//! these primitives can back a login flow.

use async_trait::async_trait;

use ag_core::SessionCookie;

use crate::error::Result;

/// One automated browser page
///
/// Implementations perform the raw operation without bounding its
/// duration; `BrowserSession` applies the per-operation timeout.
#[async_trait]
pub trait PageDriver: Send {
    /// Navigate the page to a URL and wait for the load to settle
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Fill an input matched by a CSS selector
    async fn fill(&mut self, selector: &str, value: &str) -> Result<()>;

    /// Click the element matched by a CSS selector
    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Block until a selector is present on the page
    async fn wait_for(&mut self, selector: &str) -> Result<()>;

    /// Whether a selector is currently present, without waiting
    async fn is_visible(&mut self, selector: &str) -> Result<bool>;

    /// Current page URL
    async fn current_url(&mut self) -> Result<String>;

    /// Cookies visible to the current page
    async fn cookies(&mut self) -> Result<Vec<SessionCookie>>;

    /// Release the underlying browser resources
    ///
    /// Must be safe to call more than once.
    async fn close(&mut self) -> Result<()>;
}

/// Launches fresh page drivers, one per authentication run
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn PageDriver>>;
}
