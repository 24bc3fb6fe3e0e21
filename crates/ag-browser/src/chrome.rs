//! Headless Chrome driver
//!
//! `PageDriver` implementation over the headless_chrome crate. CDP calls
//! are blocking, so every operation is bridged onto the blocking thread
//! pool with `spawn_blocking`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use tokio::task;
use tracing::{debug, info};

use ag_core::SessionCookie;

use crate::driver::{DriverFactory, PageDriver};
use crate::error::{BrowserError, Result};

/// Chrome launch configuration
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// Whether to run in headless mode
    pub headless: bool,
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Element lookup timeout
    pub element_timeout: Duration,
    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1280,
            height: 720,
            element_timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

impl ChromeOptions {
    /// Create a new configuration builder
    pub fn builder() -> ChromeOptionsBuilder {
        ChromeOptionsBuilder::default()
    }
}

/// Builder for ChromeOptions
#[derive(Default)]
pub struct ChromeOptionsBuilder {
    options: ChromeOptions,
}

impl ChromeOptionsBuilder {
    pub fn headless(mut self, headless: bool) -> Self {
        self.options.headless = headless;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.options.width = width;
        self.options.height = height;
        self
    }

    pub fn element_timeout(mut self, timeout: Duration) -> Self {
        self.options.element_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> ChromeOptions {
        self.options
    }
}

/// PageDriver backed by a local headless Chrome process
pub struct ChromeDriver {
    browser: Option<Browser>,
    tab: Arc<Tab>,
    options: ChromeOptions,
}

impl ChromeDriver {
    /// Launch a Chrome process and open its initial tab
    ///
    /// Blocking; callers on the async runtime should go through
    /// `ChromeDriverFactory`.
    pub fn launch(options: ChromeOptions) -> Result<Self> {
        use std::ffi::OsStr;

        info!("Launching Chrome (headless: {})", options.headless);

        let mut args: Vec<String> = vec![
            format!("--window-size={},{}", options.width, options.height),
            "--no-sandbox".to_string(),
            "--disable-setuid-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--no-first-run".to_string(),
        ];

        if let Some(ref ua) = options.user_agent {
            args.push(format!("--user-agent={}", ua));
        }

        let os_args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();

        let launch_options = LaunchOptionsBuilder::default()
            .headless(options.headless)
            .args(os_args)
            .build()
            .map_err(|e| {
                BrowserError::Initialization(format!("Failed to build launch options: {}", e))
            })?;

        let browser = Browser::new(launch_options)
            .map_err(|e| BrowserError::Initialization(format!("Failed to launch browser: {}", e)))?;

        let tab = {
            let tabs = browser.get_tabs();
            let tabs_guard = tabs
                .lock()
                .map_err(|e| BrowserError::Initialization(format!("Failed to lock tabs: {}", e)))?;
            tabs_guard.first().cloned().ok_or_else(|| {
                BrowserError::Initialization("No initial tab available".to_string())
            })?
        };

        info!("Chrome launched");

        Ok(Self {
            browser: Some(browser),
            tab,
            options,
        })
    }

    fn join_error(e: task::JoinError) -> BrowserError {
        BrowserError::Interaction(format!("Driver task failed: {}", e))
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let url = url.to_string();

        info!("Navigating to: {}", url);

        task::spawn_blocking(move || {
            tab.navigate_to(&url)
                .map_err(|e| BrowserError::Navigation(format!("Failed to navigate to {}: {}", url, e)))?;
            tab.wait_until_navigated()
                .map_err(|e| BrowserError::Navigation(format!("Navigation did not settle: {}", e)))?;
            Ok(())
        })
        .await
        .map_err(Self::join_error)?
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let selector = selector.to_string();
        let value = value.to_string();
        let timeout = self.options.element_timeout;

        debug!("Filling element: {} ({} chars)", selector, value.len());

        task::spawn_blocking(move || {
            let element = tab
                .wait_for_element_with_custom_timeout(&selector, timeout)
                .map_err(|e| {
                    BrowserError::ElementNotFound(format!("Element '{}' not found: {}", selector, e))
                })?;

            // Focus first, then type into the focused element.
            element.click().map_err(|e| {
                BrowserError::Interaction(format!("Failed to focus '{}': {}", selector, e))
            })?;

            tab.type_str(&value).map_err(|e| {
                BrowserError::Interaction(format!("Failed to type into '{}': {}", selector, e))
            })?;

            Ok(())
        })
        .await
        .map_err(Self::join_error)?
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let selector = selector.to_string();
        let timeout = self.options.element_timeout;

        debug!("Clicking element: {}", selector);

        task::spawn_blocking(move || {
            tab.wait_for_element_with_custom_timeout(&selector, timeout)
                .map_err(|e| {
                    BrowserError::ElementNotFound(format!("Element '{}' not found: {}", selector, e))
                })?
                .click()
                .map_err(|e| {
                    BrowserError::Interaction(format!("Failed to click '{}': {}", selector, e))
                })?;
            Ok(())
        })
        .await
        .map_err(Self::join_error)?
    }

    async fn wait_for(&mut self, selector: &str) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let selector = selector.to_string();
        let timeout = self.options.element_timeout;

        debug!("Waiting for element: {} (timeout: {:?})", selector, timeout);

        task::spawn_blocking(move || {
            tab.wait_for_element_with_custom_timeout(&selector, timeout)
                .map_err(|e| {
                    BrowserError::Timeout(format!(
                        "Element '{}' did not appear within timeout: {}",
                        selector, e
                    ))
                })?;
            Ok(())
        })
        .await
        .map_err(Self::join_error)?
    }

    async fn is_visible(&mut self, selector: &str) -> Result<bool> {
        let tab = Arc::clone(&self.tab);
        let selector = selector.to_string();

        task::spawn_blocking(move || Ok(tab.find_element(&selector).is_ok()))
            .await
            .map_err(Self::join_error)?
    }

    async fn current_url(&mut self) -> Result<String> {
        let tab = Arc::clone(&self.tab);

        task::spawn_blocking(move || Ok(tab.get_url()))
            .await
            .map_err(Self::join_error)?
    }

    async fn cookies(&mut self) -> Result<Vec<SessionCookie>> {
        let tab = Arc::clone(&self.tab);

        task::spawn_blocking(move || {
            let cookies = tab
                .get_cookies()
                .map_err(|e| BrowserError::Extraction(format!("Failed to read cookies: {}", e)))?;

            Ok(cookies
                .into_iter()
                .map(|c| SessionCookie {
                    name: c.name,
                    value: c.value,
                    domain: c.domain,
                })
                .collect())
        })
        .await
        .map_err(Self::join_error)?
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the Browser handle terminates the Chrome process.
        if let Some(browser) = self.browser.take() {
            info!("Closing Chrome");
            task::spawn_blocking(move || drop(browser))
                .await
                .map_err(Self::join_error)?;
        }
        Ok(())
    }
}

/// Launches one ChromeDriver per authentication run
pub struct ChromeDriverFactory {
    options: ChromeOptions,
}

impl ChromeDriverFactory {
    pub fn new(options: ChromeOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl DriverFactory for ChromeDriverFactory {
    async fn launch(&self) -> Result<Box<dyn PageDriver>> {
        let options = self.options.clone();
        let driver = task::spawn_blocking(move || ChromeDriver::launch(options))
            .await
            .map_err(ChromeDriver::join_error)??;
        Ok(Box::new(driver))
    }
}
