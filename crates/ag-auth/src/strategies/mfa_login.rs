//! Form login with a second-factor step

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use ag_browser::{BrowserError, BrowserSession};
use ag_core::Credentials;

use crate::strategy::{Attempt, AuthStrategy, find_session_cookie};
use crate::twofa::{
    ProvidedCodeHandler, SecondFactorHandler, SecondFactorOutcome, handler_chain,
};

/// Selectors for the multi-factor form flow
#[derive(Debug, Clone)]
pub struct MfaSelectors {
    pub login_path: String,
    pub identifier: String,
    pub secret: String,
    pub submit: String,
    pub error_banner: String,
    pub dashboard_marker: String,
    /// Element marking the second-factor prompt page
    pub prompt_marker: String,
}

impl Default for MfaSelectors {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            identifier: "input[type='email']".to_string(),
            secret: "input[type='password']".to_string(),
            submit: "button[type='submit']".to_string(),
            error_banner: ".alert-error".to_string(),
            dashboard_marker: "[data-qa='dashboard']".to_string(),
            prompt_marker: "input[autocomplete='one-time-code']".to_string(),
        }
    }
}

/// Form submission followed by a second-factor prompt
pub struct MfaLoginStrategy {
    base_url: String,
    selectors: MfaSelectors,
    handlers: Vec<Arc<dyn SecondFactorHandler>>,
}

impl MfaLoginStrategy {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            selectors: MfaSelectors::default(),
            handlers: handler_chain(vec![Arc::new(ProvidedCodeHandler::new())]),
        }
    }

    pub fn with_selectors(mut self, selectors: MfaSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_handlers(mut self, handlers: Vec<Arc<dyn SecondFactorHandler>>) -> Self {
        self.handlers = handler_chain(handlers);
        self
    }

    fn login_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.selectors.login_path
        )
    }

    /// Run the prompt through the handler chain
    ///
    /// Returns `None` when the prompt was completed, or the failure
    /// reason when it could not be.
    async fn complete_second_factor(
        &self,
        session: &mut BrowserSession,
        credentials: &Credentials,
    ) -> Result<Option<String>, BrowserError> {
        for handler in &self.handlers {
            if !handler.can_handle(session).await? {
                continue;
            }
            debug!("Second-factor handler '{}' matched", handler.name());
            return match handler.apply(session, credentials).await? {
                SecondFactorOutcome::Completed => Ok(None),
                SecondFactorOutcome::Unavailable(reason) => Ok(Some(reason)),
            };
        }
        Ok(Some("unsupported second factor prompt".to_string()))
    }

    async fn try_login(
        &self,
        session: &mut BrowserSession,
        credentials: &Credentials,
    ) -> Result<Attempt, BrowserError> {
        let url = self.login_url();
        info!("Starting multi-factor login at {}", url);

        session.navigate(&url).await?;
        session.wait_for(&self.selectors.identifier).await?;
        session
            .fill(&self.selectors.identifier, &credentials.identifier)
            .await?;
        session
            .fill(&self.selectors.secret, &credentials.secret)
            .await?;
        session.click(&self.selectors.submit).await?;

        if session.is_visible(&self.selectors.error_banner).await? {
            return Ok(Attempt::failure("invalid credentials"));
        }

        if session.is_visible(&self.selectors.prompt_marker).await? {
            if let Some(reason) = self.complete_second_factor(session, credentials).await? {
                return Ok(Attempt::failure(reason));
            }
            // A wrong code surfaces the error banner again.
            if session.is_visible(&self.selectors.error_banner).await? {
                return Ok(Attempt::failure("invalid second factor"));
            }
        }

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
impl AuthStrategy for MfaLoginStrategy {
    fn flow(&self) -> &str {
        "mfa-login"
    }

    fn description(&self) -> &str {
        "Form login followed by a one-time-code prompt"
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
