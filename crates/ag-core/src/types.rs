//! Core data types
//!
//! Credentials are call-scoped input and are never persisted. A
//! `SessionArtifact` is the normalized result of one authentication
//! attempt; exactly one of `token` / `reason` is set, depending on the
//! outcome, and the two constructors are the only way to build one.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Login input for a single authentication run
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account identifier (email or username)
    pub identifier: String,
    /// Account secret (password)
    pub secret: String,
    /// Optional second factor (OTP code)
    pub second_factor: Option<String>,
}

impl Credentials {
    /// Create credentials without a second factor
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            second_factor: None,
        }
    }

    /// Attach a second-factor code
    pub fn with_second_factor(mut self, code: impl Into<String>) -> Self {
        self.second_factor = Some(code.into());
        self
    }
}

// Secrets stay out of logs; only the identifier is printed in clear.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"***")
            .field(
                "second_factor",
                &self.second_factor.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

/// Outcome of an authentication attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

/// Browser session cookie captured on successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

/// OAuth tokens acquired during a token-based flow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

/// Normalized result of one authentication attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionArtifact {
    /// Unique session identifier
    pub id: String,
    /// Flow identifier that produced this artifact
    pub flow: String,
    /// Attempt outcome
    pub outcome: Outcome,
    /// Session token, present iff the outcome is Success
    pub token: Option<String>,
    /// Failure reason, present iff the outcome is Failure
    pub reason: Option<String>,
    /// Session cookies captured from the browser
    #[serde(default)]
    pub cookies: Vec<SessionCookie>,
    /// OAuth tokens when a token flow was used
    pub oauth_tokens: Option<OAuthTokens>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
}

impl SessionArtifact {
    /// Create a successful artifact valid for `ttl_secs` from now
    pub fn success(flow: impl Into<String>, token: impl Into<String>, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            flow: flow.into(),
            outcome: Outcome::Success,
            token: Some(token.into()),
            reason: None,
            cookies: Vec::new(),
            oauth_tokens: None,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_secs),
        }
    }

    /// Create a failure artifact
    ///
    /// Failed attempts expire immediately; they are stored for
    /// inspection but never usable as sessions.
    pub fn failure(flow: impl Into<String>, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            flow: flow.into(),
            outcome: Outcome::Failure,
            token: None,
            reason: Some(reason.into()),
            cookies: Vec::new(),
            oauth_tokens: None,
            created_at: now,
            expires_at: now,
        }
    }

    /// Attach captured cookies
    pub fn with_cookies(mut self, cookies: Vec<SessionCookie>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Attach OAuth tokens
    pub fn with_oauth_tokens(mut self, tokens: OAuthTokens) -> Self {
        self.oauth_tokens = Some(tokens);
        self
    }

    /// Whether the artifact has passed its expiry time
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check the token/reason invariant
    ///
    /// Success requires a non-empty token and no reason; Failure the
    /// reverse. Holds by construction, checked in tests.
    pub fn is_valid(&self) -> bool {
        match self.outcome {
            Outcome::Success => {
                self.token.as_deref().is_some_and(|t| !t.is_empty()) && self.reason.is_none()
            }
            Outcome::Failure => {
                self.token.is_none() && self.reason.as_deref().is_some_and(|r| !r.is_empty())
            }
        }
    }
}
