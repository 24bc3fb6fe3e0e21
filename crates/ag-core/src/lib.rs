//! ag-core: authgate core library
//!
//! Shared types, error taxonomy, configuration, and the mock session
//! store used by the strategy runner and the HTTP API.

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::{ApiConfig, BrowserOptions, Config, OauthConfig};
pub use error::{Error, Result};
pub use store::SessionStore;
pub use types::{Credentials, OAuthTokens, Outcome, SessionArtifact, SessionCookie};
