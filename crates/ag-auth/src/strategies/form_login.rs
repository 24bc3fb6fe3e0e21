//! Form-based login flow

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use ag_browser::{BrowserError, BrowserSession};
use ag_core::Credentials;

use crate::captcha::{CaptchaSolver, NoopSolver};
use crate::strategy::{Attempt, AuthStrategy, find_session_cookie};

/// Selectors the form flow drives
///
/// Defaults cover the common login-page markup; a deployment targeting
/// a specific site registers the strategy with its own set.
#[derive(Debug, Clone)]
pub struct FormSelectors {
    /// Login page path under the base URL
    pub login_path: String,
    pub identifier: String,
    pub secret: String,
    pub submit: String,
    pub error_banner: String,
    /// Element whose presence confirms a landed login
    pub dashboard_marker: String,
}

impl Default for FormSelectors {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            identifier: "input[type='email']".to_string(),
            secret: "input[type='password']".to_string(),
            submit: "button[type='submit']".to_string(),
            error_banner: ".alert-error".to_string(),
            dashboard_marker: "[data-qa='dashboard']".to_string(),
        }
    }
}

/// Classic identifier + secret form submission
pub struct FormLoginStrategy {
    base_url: String,
    selectors: FormSelectors,
    captcha: Arc<dyn CaptchaSolver>,
}

impl FormLoginStrategy {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            selectors: FormSelectors::default(),
            captcha: Arc::new(NoopSolver::new()),
        }
    }

    pub fn with_selectors(mut self, selectors: FormSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_captcha_solver(mut self, solver: Arc<dyn CaptchaSolver>) -> Self {
        self.captcha = solver;
        self
    }

    fn login_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.selectors.login_path
        )
    }

    async fn try_login(
        &self,
        session: &mut BrowserSession,
        credentials: &Credentials,
    ) -> Result<Attempt, BrowserError> {
        let url = self.login_url();
        info!("Starting form login at {}", url);

        session.navigate(&url).await?;
        session.wait_for(&self.selectors.identifier).await?;
        session
            .fill(&self.selectors.identifier, &credentials.identifier)
            .await?;
        session
            .fill(&self.selectors.secret, &credentials.secret)
            .await?;

        if self.captcha.detect(session).await? && !self.captcha.solve(session).await? {
            return Ok(Attempt::failure("captcha challenge present"));
        }

        session.click(&self.selectors.submit).await?;

        if session.is_visible(&self.selectors.error_banner).await? {
            debug!("Error banner visible after submit");
            return Ok(Attempt::failure("invalid credentials"));
        }

        // Landing is only confirmed by the dashboard marker; a quiet
        // page without it is a failure, not a success.
        match session.wait_for(&self.selectors.dashboard_marker).await {
            Ok(()) => {}
            Err(BrowserError::ElementNotFound(_)) => {
                return Ok(Attempt::failure("login not confirmed"));
            }
            Err(e) => return Err(e),
        }

        let cookies = session.cookies().await?;
        match find_session_cookie(&cookies) {
            Some(cookie) => {
                let token = cookie.value.clone();
                Ok(Attempt::success(token).with_cookies(cookies))
            }
            None => Ok(Attempt::failure("no session token issued")),
        }
    }
}

#[async_trait]
impl AuthStrategy for FormLoginStrategy {
    fn flow(&self) -> &str {
        "form-login"
    }

    fn description(&self) -> &str {
        "Identifier and secret submitted through the site's login form"
    }

    async fn execute(
        &self,
        session: &mut BrowserSession,
        credentials: &Credentials,
    ) -> ag_core::Result<Attempt> {
        match self.try_login(session, credentials).await {
            Ok(attempt) => Ok(attempt),
            Err(e) => Ok(Attempt::from_browser_error(e)),
        }
    }
}
