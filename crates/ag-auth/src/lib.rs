//! ag-auth: pluggable authentication flows for authgate
//!
//! The strategy runner at the center of the gateway: a registry of
//! login mechanisms, each driving a browser session and producing a
//! normalized session artifact.

pub mod captcha;
pub mod factory;
pub mod oauth;
pub mod runner;
pub mod strategies;
pub mod strategy;
pub mod twofa;

pub use captcha::{CaptchaSolver, NoopSolver};
pub use factory::StrategyFactory;
pub use oauth::{CodeExchange, HttpTokenExchanger, TokenExchanger};
pub use runner::AuthRunner;
pub use strategies::{
    FormLoginStrategy, FormSelectors, MfaLoginStrategy, MfaSelectors, TokenLoginStrategy,
    TokenSelectors,
};
pub use strategy::{Attempt, AuthStrategy, find_session_cookie};
pub use twofa::{ProvidedCodeHandler, SecondFactorHandler, SecondFactorOutcome, handler_chain};
