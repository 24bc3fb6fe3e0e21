//! ag-browser: browser automation layer for authgate
//!
//! Wraps a headless browser behind the small capability set the
//! authentication core consumes: navigate, fill, click, wait, inspect,
//! close. Two drivers are provided: a headless-Chrome driver for real
//! runs and a scripted mock for development and tests.

pub mod chrome;
pub mod driver;
pub mod error;
pub mod mock;
pub mod session;

pub use chrome::{ChromeDriver, ChromeDriverFactory, ChromeOptions};
pub use driver::{DriverFactory, PageDriver};
pub use error::{BrowserError, Result};
pub use mock::{ClickEffect, DriverSpy, MockDriver, MockDriverFactory, MockScript};
pub use session::{BrowserSession, DEFAULT_OP_TIMEOUT};
