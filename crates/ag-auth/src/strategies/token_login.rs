//! Token-based login via a hosted authorize page

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use ag_browser::{BrowserError, BrowserSession};
use ag_core::{Credentials, OauthConfig};

use crate::oauth::{CodeExchange, HttpTokenExchanger, TokenExchanger};
use crate::strategy::{Attempt, AuthStrategy};

/// How often and how long to poll for the authorization redirect
const REDIRECT_POLL_INTERVAL: Duration = Duration::from_millis(200);
const REDIRECT_POLL_ATTEMPTS: u32 = 25;

/// Selectors for the hosted authorize page
#[derive(Debug, Clone)]
pub struct TokenSelectors {
    pub identifier: String,
    pub secret: String,
    pub submit: String,
    pub error_banner: String,
    /// Consent button shown after a first-time sign-in, if any
    pub consent_button: String,
}

impl Default for TokenSelectors {
    fn default() -> Self {
        Self {
            identifier: "input[type='email']".to_string(),
            secret: "input[type='password']".to_string(),
            submit: "button[type='submit']".to_string(),
            error_banner: ".alert-error".to_string(),
            consent_button: "button[data-qa='allow']".to_string(),
        }
    }
}

/// Authorization-code flow: sign in on the hosted page, capture the
/// redirect code, exchange it for tokens off-browser
pub struct TokenLoginStrategy {
    base_url: String,
    oauth: OauthConfig,
    selectors: TokenSelectors,
    exchanger: Arc<dyn TokenExchanger>,
}

impl TokenLoginStrategy {
    pub fn new(base_url: impl Into<String>, oauth: OauthConfig) -> Self {
        Self {
            base_url: base_url.into(),
            oauth,
            selectors: TokenSelectors::default(),
            exchanger: Arc::new(HttpTokenExchanger::new()),
        }
    }

    pub fn with_selectors(mut self, selectors: TokenSelectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_exchanger(mut self, exchanger: Arc<dyn TokenExchanger>) -> Self {
        self.exchanger = exchanger;
        self
    }

    fn authorize_url(&self) -> Result<String, String> {
        let path = self
            .oauth
            .authorize_path
            .clone()
            .unwrap_or_else(|| "/oauth/authorize".to_string());

        let base = if path.starts_with("http://") || path.starts_with("https://") {
            path
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), path)
        };

        let client_id = self
            .oauth
            .client_id
            .clone()
            .ok_or("oauth client_id not configured")?;
        let redirect_uri = self
            .oauth
            .redirect_uri
            .clone()
            .ok_or("oauth redirect_uri not configured")?;

        let mut url = Url::parse(&base).map_err(|e| format!("invalid authorize URL: {}", e))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &client_id)
            .append_pair("redirect_uri", &redirect_uri);

        Ok(url.into())
    }

    /// Poll the page URL until it lands on the redirect URI
    async fn capture_redirect_code(
        &self,
        session: &mut BrowserSession,
        redirect_uri: &str,
    ) -> Result<Option<String>, BrowserError> {
        for _ in 0..REDIRECT_POLL_ATTEMPTS {
            let current = session.current_url().await?;
            if current.starts_with(redirect_uri) {
                debug!("Authorization redirect observed");
                let code = Url::parse(&current)
                    .ok()
                    .and_then(|url| {
                        url.query_pairs()
                            .find(|(k, _)| k == "code")
                            .map(|(_, v)| v.into_owned())
                    })
                    .filter(|code| !code.is_empty());
                return Ok(code);
            }
            tokio::time::sleep(REDIRECT_POLL_INTERVAL).await;
        }
        Err(BrowserError::Timeout(
            "Authorization redirect not observed".to_string(),
        ))
    }

    async fn try_login(
        &self,
        session: &mut BrowserSession,
        credentials: &Credentials,
    ) -> Result<Attempt, BrowserError> {
        let authorize_url = match self.authorize_url() {
            Ok(url) => url,
            Err(reason) => return Ok(Attempt::failure(reason)),
        };
        // authorize_url() already validated redirect_uri is present.
        let redirect_uri = self.oauth.redirect_uri.clone().unwrap_or_default();

        info!("Starting token login at {}", authorize_url);

        session.navigate(&authorize_url).await?;
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

        if session.is_visible(&self.selectors.consent_button).await? {
            debug!("Consent screen shown, approving");
            session.click(&self.selectors.consent_button).await?;
        }

        let Some(code) = self.capture_redirect_code(session, &redirect_uri).await? else {
            return Ok(Attempt::failure("redirect missing authorization code"));
        };

        let exchange = CodeExchange {
            token_url: self
                .oauth
                .token_url
                .clone()
                .unwrap_or_else(|| format!("{}/oauth/token", self.base_url.trim_end_matches('/'))),
            client_id: self.oauth.client_id.clone().unwrap_or_default(),
            client_secret: self.oauth.client_secret.clone().unwrap_or_default(),
            redirect_uri,
            code,
        };

        let tokens = match self.exchanger.exchange(&exchange).await {
            Ok(tokens) => tokens,
            Err(e) => return Ok(Attempt::failure(format!("token exchange failed: {}", e))),
        };

        let Some(access_token) = tokens.access_token.clone().filter(|t| !t.is_empty()) else {
            return Ok(Attempt::failure("no access token in token response"));
        };

        let cookies = session.cookies().await?;
        Ok(Attempt::success(access_token)
            .with_cookies(cookies)
            .with_oauth_tokens(tokens))
    }
}

#[async_trait]
impl AuthStrategy for TokenLoginStrategy {
    fn flow(&self) -> &str {
        "token-login"
    }

    fn description(&self) -> &str {
        "Authorization-code sign-in on the hosted authorize page"
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_includes_query() {
        let strategy = TokenLoginStrategy::new(
            "https://site.test",
            OauthConfig {
                client_id: Some("client".into()),
                redirect_uri: Some("http://localhost:3000/callback".into()),
                ..Default::default()
            },
        );

        let url = strategy.authorize_url().unwrap();
        assert!(url.starts_with("https://site.test/oauth/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client"));
    }

    #[test]
    fn test_authorize_url_requires_client_id() {
        let strategy = TokenLoginStrategy::new("https://site.test", OauthConfig::default());
        let err = strategy.authorize_url().unwrap_err();
        assert!(err.contains("client_id"));
    }
}
