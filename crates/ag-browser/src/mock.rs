//! Scripted mock driver
//!
//! In-memory stand-in for a real browser, used for development and
//! testing. A `MockScript` describes pages (selectors present after
//! navigation), click effects (conditional on filled values), and
//! per-selector wait delays. The factory and driver count launches,
//! navigations, and closes so tests can assert resource lifecycles.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use ag_core::SessionCookie;

use crate::driver::{DriverFactory, PageDriver};
use crate::error::{BrowserError, Result};

/// Condition a click effect checks against previously filled values
#[derive(Debug, Clone)]
enum Requirement {
    /// Selector must have been filled with exactly this value
    FilledEquals(String, String),
    /// Selector must have been filled with any non-empty value
    FilledNonEmpty(String),
}

/// What a click does to the scripted page
#[derive(Debug, Clone, Default)]
pub struct ClickEffect {
    require: Option<Requirement>,
    show: Vec<String>,
    hide: Vec<String>,
    otherwise_show: Vec<String>,
    goto: Option<String>,
    cookies: Vec<SessionCookie>,
}

impl ClickEffect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effect applies only when `selector` was filled with `value`
    pub fn require_fill(mut self, selector: impl Into<String>, value: impl Into<String>) -> Self {
        self.require = Some(Requirement::FilledEquals(selector.into(), value.into()));
        self
    }

    /// Effect applies only when `selector` was filled with anything
    pub fn require_nonempty(mut self, selector: impl Into<String>) -> Self {
        self.require = Some(Requirement::FilledNonEmpty(selector.into()));
        self
    }

    /// Selector that becomes visible when the requirement passes
    pub fn show(mut self, selector: impl Into<String>) -> Self {
        self.show.push(selector.into());
        self
    }

    /// Selector removed when the requirement passes
    pub fn hide(mut self, selector: impl Into<String>) -> Self {
        self.hide.push(selector.into());
        self
    }

    /// Selector that becomes visible when the requirement fails
    pub fn otherwise_show(mut self, selector: impl Into<String>) -> Self {
        self.otherwise_show.push(selector.into());
        self
    }

    /// New page URL after a passing click (redirects)
    pub fn goto(mut self, url: impl Into<String>) -> Self {
        self.goto = Some(url.into());
        self
    }

    /// Cookie granted by a passing click
    pub fn cookie(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        self.cookies.push(SessionCookie {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
        });
        self
    }
}

/// Declarative description of the pages a mock run will see
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    pages: HashMap<String, Vec<String>>,
    clicks: HashMap<String, ClickEffect>,
    wait_delays: HashMap<String, Duration>,
    navigation_failures: HashSet<String>,
}

impl MockScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page: navigating to `url` makes `selectors` visible
    pub fn page<I, S>(mut self, url: impl Into<String>, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pages
            .insert(url.into(), selectors.into_iter().map(Into::into).collect());
        self
    }

    /// Attach an effect to clicking `selector`
    pub fn on_click(mut self, selector: impl Into<String>, effect: ClickEffect) -> Self {
        self.clicks.insert(selector.into(), effect);
        self
    }

    /// Make `wait_for(selector)` stall for `delay` before resolving
    pub fn delay(mut self, selector: impl Into<String>, delay: Duration) -> Self {
        self.wait_delays.insert(selector.into(), delay);
        self
    }

    /// Make navigation to `url` fail
    pub fn fail_navigation(mut self, url: impl Into<String>) -> Self {
        self.navigation_failures.insert(url.into());
        self
    }
}

/// Shared operation counters for lifecycle assertions
#[derive(Debug, Clone, Default)]
pub struct DriverSpy {
    launches: Arc<AtomicUsize>,
    navigations: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl DriverSpy {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> usize {
        self.navigations.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Scripted PageDriver
pub struct MockDriver {
    script: MockScript,
    visible: HashSet<String>,
    fills: HashMap<String, String>,
    url: String,
    cookies: Vec<SessionCookie>,
    closed: bool,
    spy: DriverSpy,
}

impl MockDriver {
    pub fn new(script: MockScript) -> Self {
        Self::with_spy(script, DriverSpy::default())
    }

    fn with_spy(script: MockScript, spy: DriverSpy) -> Self {
        Self {
            script,
            visible: HashSet::new(),
            fills: HashMap::new(),
            url: String::from("about:blank"),
            cookies: Vec::new(),
            closed: false,
            spy,
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        Ok(())
    }

    fn requirement_met(&self, requirement: &Requirement) -> bool {
        match requirement {
            Requirement::FilledEquals(selector, value) => {
                self.fills.get(selector).is_some_and(|v| v == value)
            }
            Requirement::FilledNonEmpty(selector) => {
                self.fills.get(selector).is_some_and(|v| !v.is_empty())
            }
        }
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.ensure_open()?;
        self.spy.navigations.fetch_add(1, Ordering::SeqCst);

        if self.script.navigation_failures.contains(url) {
            return Err(BrowserError::Navigation(format!(
                "Scripted navigation failure for {}",
                url
            )));
        }

        // Exact page match first, then longest prefix, so scripted
        // pages don't have to spell out every query string.
        let selectors = self.script.pages.get(url).or_else(|| {
            self.script
                .pages
                .iter()
                .filter(|(key, _)| url.starts_with(key.as_str()))
                .max_by_key(|(key, _)| key.len())
                .map(|(_, selectors)| selectors)
        });

        self.url = url.to_string();
        self.visible = selectors
            .map(|selectors| selectors.iter().cloned().collect())
            .unwrap_or_default();
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        if !self.visible.contains(selector) {
            return Err(BrowserError::ElementNotFound(format!(
                "Element '{}' not on page",
                selector
            )));
        }
        self.fills.insert(selector.to_string(), value.to_string());
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        self.ensure_open()?;
        if !self.visible.contains(selector) {
            return Err(BrowserError::ElementNotFound(format!(
                "Element '{}' not on page",
                selector
            )));
        }

        let Some(effect) = self.script.clicks.get(selector).cloned() else {
            return Ok(());
        };

        let passed = effect
            .require
            .as_ref()
            .map(|r| self.requirement_met(r))
            .unwrap_or(true);

        if passed {
            for s in &effect.hide {
                self.visible.remove(s);
            }
            self.visible.extend(effect.show.iter().cloned());
            self.cookies.extend(effect.cookies.iter().cloned());
            if let Some(url) = &effect.goto {
                self.url = url.clone();
            }
        } else {
            self.visible.extend(effect.otherwise_show.iter().cloned());
        }
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str) -> Result<()> {
        self.ensure_open()?;
        if let Some(delay) = self.script.wait_delays.get(selector) {
            tokio::time::sleep(*delay).await;
        }
        if self.visible.contains(selector) {
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound(format!(
                "Element '{}' never appeared",
                selector
            )))
        }
    }

    async fn is_visible(&mut self, selector: &str) -> Result<bool> {
        self.ensure_open()?;
        Ok(self.visible.contains(selector))
    }

    async fn current_url(&mut self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.url.clone())
    }

    async fn cookies(&mut self) -> Result<Vec<SessionCookie>> {
        self.ensure_open()?;
        Ok(self.cookies.clone())
    }

    async fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.spy.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Produces fresh scripted drivers sharing one spy
pub struct MockDriverFactory {
    script: MockScript,
    spy: DriverSpy,
    fail_launch: bool,
}

impl MockDriverFactory {
    pub fn new(script: MockScript) -> Self {
        Self {
            script,
            spy: DriverSpy::default(),
            fail_launch: false,
        }
    }

    /// Make every launch fail, for error-path tests
    pub fn failing(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// Handle to the shared counters
    pub fn spy(&self) -> DriverSpy {
        self.spy.clone()
    }
}

#[async_trait]
impl DriverFactory for MockDriverFactory {
    async fn launch(&self) -> Result<Box<dyn PageDriver>> {
        if self.fail_launch {
            return Err(BrowserError::Initialization(
                "Scripted launch failure".to_string(),
            ));
        }
        self.spy.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockDriver::with_spy(
            self.script.clone(),
            self.spy.clone(),
        )))
    }
}
