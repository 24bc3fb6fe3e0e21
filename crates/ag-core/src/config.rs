//! Configuration management
//!
//! Settings are resolved in the following order:
//! 1. Environment variables
//! 2. authgate.toml configuration file
//! 3. Defaults
//!
//! Inside the configuration file, `${VAR_NAME}` expands to the value of
//! the named environment variable.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// Main configuration for authgate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target site origin the login flows run against
    pub base_url: String,

    /// Per-operation browser timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Run the browser without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Session artifact lifetime in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: i64,

    /// HTTP API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Browser window configuration
    #[serde(default)]
    pub browser: BrowserOptions,

    /// OAuth client configuration for the token-login flow
    #[serde(default)]
    pub oauth: OauthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API key for HTTP API authentication (unauthenticated when unset)
    pub key: Option<String>,

    /// Port for the HTTP API server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins; permissive when unset
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: None,
            port: default_api_port(),
            allowed_origins: None,
        }
    }
}

/// Browser window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserOptions {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,

    /// Custom user agent
    pub user_agent: Option<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
            user_agent: None,
        }
    }
}

/// OAuth client settings for the token-login flow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OauthConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: Option<String>,
    /// Hosted authorize page, relative to base_url when not absolute
    pub authorize_path: Option<String>,
    /// Token exchange endpoint
    pub token_url: Option<String>,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_headless() -> bool {
    true
}

fn default_session_ttl_secs() -> i64 {
    3600
}

fn default_api_port() -> u16 {
    3000
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            headless: default_headless(),
            session_ttl_secs: default_session_ttl_secs(),
            api: ApiConfig::default(),
            browser: BrowserOptions::default(),
            oauth: OauthConfig::default(),
        }
    }
}

impl Config {
    /// Expand `${VAR_NAME}` references against the environment
    ///
    /// Unset variables expand to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // consume '{'

                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '}' {
                        chars.next(); // consume '}'
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file
    ///
    /// `${VAR_NAME}` references in the file are expanded first;
    /// environment variables then override the parsed values.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let toml: TomlConfig = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut cfg = Self::from_toml_config(toml);
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// Load configuration from the default locations
    ///
    /// Tries `./authgate.toml` first, then falls back to environment
    /// variables only.
    pub fn load() -> crate::Result<Self> {
        if Path::new("authgate.toml").exists() {
            return Self::from_toml_file("authgate.toml");
        }

        Self::from_env()
    }

    fn from_toml_config(toml: TomlConfig) -> Self {
        let api = toml.api.unwrap_or_default();
        let api_config = ApiConfig {
            key: api.key,
            port: api.port.unwrap_or_else(default_api_port),
            allowed_origins: api.allowed_origins,
        };

        let browser = toml.browser.unwrap_or_default();
        let browser_config = BrowserOptions {
            width: browser.width.unwrap_or_else(default_window_width),
            height: browser.height.unwrap_or_else(default_window_height),
            user_agent: browser.user_agent,
        };

        let oauth = toml.oauth.unwrap_or_default();
        let oauth_config = OauthConfig {
            client_id: oauth.client_id,
            client_secret: oauth.client_secret,
            redirect_uri: oauth.redirect_uri,
            authorize_path: oauth.authorize_path,
            token_url: oauth.token_url,
        };

        Config {
            base_url: toml.base_url.unwrap_or_else(default_base_url),
            timeout_ms: toml.timeout_ms.unwrap_or_else(default_timeout_ms),
            headless: toml.headless.unwrap_or_else(default_headless),
            session_ttl_secs: toml
                .session_ttl_secs
                .unwrap_or_else(default_session_ttl_secs),
            api: api_config,
            browser: browser_config,
            oauth: oauth_config,
        }
    }

    /// Override settings from environment variables
    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("BASE_URL") {
            if !base_url.is_empty() {
                self.base_url = base_url;
            }
        }

        if let Ok(timeout) = std::env::var("TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.timeout_ms = ms;
            }
        }

        if let Ok(headless) = std::env::var("HEADLESS") {
            self.headless = headless.to_lowercase() != "false";
        }

        if let Ok(ttl) = std::env::var("SESSION_TTL_SECS") {
            if let Ok(secs) = ttl.parse() {
                self.session_ttl_secs = secs;
            }
        }

        if let Ok(key) = std::env::var("API_KEY") {
            self.api.key = Some(key);
        }
        if let Ok(port) = std::env::var("API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Ok(origins) = std::env::var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins =
                Some(origins.split(',').map(|s| s.trim().to_string()).collect());
        }

        if let Ok(ua) = std::env::var("BROWSER_USER_AGENT") {
            self.browser.user_agent = Some(ua);
        }

        if let Ok(id) = std::env::var("OAUTH_CLIENT_ID") {
            self.oauth.client_id = Some(id);
        }
        if let Ok(secret) = std::env::var("OAUTH_CLIENT_SECRET") {
            self.oauth.client_secret = Some(secret);
        }
        if let Ok(uri) = std::env::var("OAUTH_REDIRECT_URI") {
            self.oauth.redirect_uri = Some(uri);
        }
        if let Ok(url) = std::env::var("OAUTH_TOKEN_URL") {
            self.oauth.token_url = Some(url);
        }
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Config::default();
        cfg.apply_env_overrides();

        if cfg.base_url.is_empty() {
            return Err(Error::Config("BASE_URL must not be empty".to_string()));
        }

        Ok(cfg)
    }

    /// Per-operation timeout as a Duration
    pub fn op_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

// ============================================================================
// TOML mirror structs (file parsing only)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TomlConfig {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
    headless: Option<bool>,
    session_ttl_secs: Option<i64>,
    api: Option<TomlApiConfig>,
    browser: Option<TomlBrowserConfig>,
    oauth: Option<TomlOauthConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlApiConfig {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlBrowserConfig {
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    user_agent: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlOauthConfig {
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    redirect_uri: Option<String>,
    #[serde(default)]
    authorize_path: Option<String>,
    #[serde(default)]
    token_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.timeout_ms, 30_000);
        assert!(config.headless);
        assert_eq!(config.session_ttl_secs, 3600);
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.browser.width, 1280);
        assert_eq!(config.browser.height, 720);
    }

    #[test]
    fn test_op_timeout() {
        let config = Config {
            timeout_ms: 1500,
            ..Default::default()
        };
        assert_eq!(config.op_timeout(), std::time::Duration::from_millis(1500));
    }

    #[test]
    fn test_expand_env_vars() {
        unsafe {
            std::env::set_var("AUTHGATE_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${AUTHGATE_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        let result = Config::expand_env_vars("prefix_${NONEXISTENT_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("AUTHGATE_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        let result = Config::expand_env_vars("no_vars_here");
        assert_eq!(result, "no_vars_here");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
base_url = "https://login.example.com"
timeout_ms = 10000
headless = false
session_ttl_secs = 900

[api]
port = 8080
key = "api_key"

[browser]
width = 1920
height = 1080
user_agent = "authgate/0.1"

[oauth]
client_id = "client"
redirect_uri = "http://localhost:3000/callback"
"#;

        let toml_config: TomlConfig = toml::from_str(toml_content).unwrap();
        let config = Config::from_toml_config(toml_config);

        assert_eq!(config.base_url, "https://login.example.com");
        assert_eq!(config.timeout_ms, 10_000);
        assert!(!config.headless);
        assert_eq!(config.session_ttl_secs, 900);
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.key.as_deref(), Some("api_key"));
        assert_eq!(config.browser.width, 1920);
        assert_eq!(config.browser.user_agent.as_deref(), Some("authgate/0.1"));
        assert_eq!(config.oauth.client_id.as_deref(), Some("client"));
        assert!(config.oauth.token_url.is_none());
    }
}
