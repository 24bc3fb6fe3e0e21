//! Authentication strategy contract
//!
//! A strategy encodes one login mechanism's navigate/fill/submit/wait
//! sequence against a `BrowserSession`. Every browser-level failure a
//! strategy can name is classified into an `Attempt::Failure` with a
//! descriptive reason; nothing transient escapes to the caller raw.

use async_trait::async_trait;

use ag_browser::{BrowserError, BrowserSession};
use ag_core::{Credentials, OAuthTokens, SessionCookie};

/// Outcome of a single strategy execution, before artifact assembly
#[derive(Debug, Clone)]
pub enum Attempt {
    Success {
        token: String,
        cookies: Vec<SessionCookie>,
        oauth_tokens: Option<OAuthTokens>,
    },
    Failure {
        reason: String,
    },
}

impl Attempt {
    /// Create a successful attempt carrying a session token
    pub fn success(token: impl Into<String>) -> Self {
        Self::Success {
            token: token.into(),
            cookies: Vec::new(),
            oauth_tokens: None,
        }
    }

    /// Create a failed attempt with a descriptive reason
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// Attach captured cookies to a successful attempt
    pub fn with_cookies(mut self, captured: Vec<SessionCookie>) -> Self {
        if let Self::Success { cookies, .. } = &mut self {
            *cookies = captured;
        }
        self
    }

    /// Attach OAuth tokens to a successful attempt
    pub fn with_oauth_tokens(mut self, tokens: OAuthTokens) -> Self {
        if let Self::Success { oauth_tokens, .. } = &mut self {
            *oauth_tokens = Some(tokens);
        }
        self
    }

    /// Classify a browser-level error into a failed attempt
    ///
    /// Timeouts keep the literal `OperationTimeout` reason so callers
    /// can tell a stalled page from a rejected login.
    pub fn from_browser_error(err: BrowserError) -> Self {
        match err {
            BrowserError::Timeout(_) => Self::failure("OperationTimeout"),
            other => Self::failure(other.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One pluggable login mechanism
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Unique flow identifier (used as the registry key)
    fn flow(&self) -> &str;

    /// Human-readable description of the mechanism
    fn description(&self) -> &str;

    /// Drive the login flow to completion on the given session
    ///
    /// Browser failures the strategy can name come back as
    /// `Ok(Attempt::Failure)`; only errors the strategy cannot classify
    /// are returned as `Err` for the runner to wrap.
    async fn execute(
        &self,
        session: &mut BrowserSession,
        credentials: &Credentials,
    ) -> ag_core::Result<Attempt>;
}

/// Pick the cookie most likely to be the session token
///
/// Matches by name the way operators name session cookies; returns the
/// first hit in cookie order.
pub fn find_session_cookie(cookies: &[SessionCookie]) -> Option<&SessionCookie> {
    cookies.iter().find(|c| {
        let name = c.name.to_lowercase();
        name.contains("session") || name.contains("auth") || name.contains("token")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_success_builders() {
        let attempt = Attempt::success("tok").with_cookies(vec![SessionCookie {
            name: "sid".into(),
            value: "v".into(),
            domain: "d".into(),
        }]);
        match attempt {
            Attempt::Success { token, cookies, .. } => {
                assert_eq!(token, "tok");
                assert_eq!(cookies.len(), 1);
            }
            Attempt::Failure { .. } => panic!("expected success"),
        }
    }

    #[test]
    fn test_with_cookies_noop_on_failure() {
        let attempt = Attempt::failure("nope").with_cookies(vec![]);
        assert!(!attempt.is_success());
    }

    #[test]
    fn test_timeout_classification() {
        let attempt = Attempt::from_browser_error(BrowserError::Timeout("wait_for".into()));
        match attempt {
            Attempt::Failure { reason } => assert_eq!(reason, "OperationTimeout"),
            _ => panic!("expected failure"),
        }
    }

    #[test]
    fn test_other_errors_keep_description() {
        let attempt =
            Attempt::from_browser_error(BrowserError::ElementNotFound("#login".into()));
        match attempt {
            Attempt::Failure { reason } => assert!(reason.contains("#login")),
            _ => panic!("expected failure"),
        }
    }

    #[test]
    fn test_find_session_cookie() {
        let cookies = vec![
            SessionCookie {
                name: "theme".into(),
                value: "dark".into(),
                domain: "site.test".into(),
            },
            SessionCookie {
                name: "session_id".into(),
                value: "abc".into(),
                domain: "site.test".into(),
            },
        ];
        assert_eq!(find_session_cookie(&cookies).unwrap().value, "abc");
        assert!(find_session_cookie(&cookies[..1]).is_none());
    }
}
