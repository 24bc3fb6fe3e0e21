//! OAuth authorization-code exchange
//!
//! After the browser leg of a token flow captures the authorization
//! code from the redirect, the code is exchanged for tokens over plain
//! HTTP, outside the browser.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use ag_core::{Error, OAuthTokens, Result};

/// Parameters for one code-for-token exchange
#[derive(Debug, Clone)]
pub struct CodeExchange {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub code: String,
}

/// Exchanges an authorization code for tokens
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, request: &CodeExchange) -> Result<OAuthTokens>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
}

/// reqwest-backed exchanger speaking the standard token endpoint shape
pub struct HttpTokenExchanger {
    client: reqwest::Client,
}

impl HttpTokenExchanger {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTokenExchanger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenExchanger for HttpTokenExchanger {
    async fn exchange(&self, request: &CodeExchange) -> Result<OAuthTokens> {
        if request.client_id.is_empty() || request.code.is_empty() {
            return Err(Error::TokenExchange(
                "Missing required parameters for token exchange".to_string(),
            ));
        }

        info!("Exchanging authorization code at {}", request.token_url);

        let response = self
            .client
            .post(&request.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", request.client_id.as_str()),
                ("client_secret", request.client_secret.as_str()),
                ("code", request.code.as_str()),
                ("redirect_uri", request.redirect_uri.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: TokenResponse = response.json().await?;

        let Some(access_token) = body.access_token.filter(|t| !t.is_empty()) else {
            return Err(Error::TokenExchange(
                "No access token in token response".to_string(),
            ));
        };

        debug!("Token exchange succeeded");

        Ok(OAuthTokens {
            access_token: Some(access_token),
            refresh_token: body.refresh_token,
            token_type: body.token_type,
            expires_in: body.expires_in,
        })
    }
}
