//! Concrete login flows

mod form_login;
mod mfa_login;
mod token_login;

pub use form_login::{FormLoginStrategy, FormSelectors};
pub use mfa_login::{MfaLoginStrategy, MfaSelectors};
pub use token_login::{TokenLoginStrategy, TokenSelectors};
