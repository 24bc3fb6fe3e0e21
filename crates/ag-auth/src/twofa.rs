//! Second-factor handling
//!
//! Handlers detect a second-factor prompt and complete it. A strategy
//! holds a chain sorted by priority; the first handler whose
//! `can_handle` matches the page gets to act.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use ag_browser::BrowserSession;
use ag_core::Credentials;

/// Result of applying a second-factor handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecondFactorOutcome {
    /// The prompt was completed and the flow may proceed
    Completed,
    /// The handler matched but could not complete (missing code, etc.)
    Unavailable(String),
}

/// One way of completing a second-factor prompt
#[async_trait]
pub trait SecondFactorHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Higher priority handlers are consulted first
    fn priority(&self) -> u8;

    /// Whether this handler recognizes the prompt on the page
    async fn can_handle(&self, session: &mut BrowserSession) -> ag_browser::Result<bool>;

    /// Complete the prompt
    async fn apply(
        &self,
        session: &mut BrowserSession,
        credentials: &Credentials,
    ) -> ag_browser::Result<SecondFactorOutcome>;
}

/// Fills the one-time code supplied with the credentials
pub struct ProvidedCodeHandler {
    code_input: String,
    verify_button: String,
}

impl ProvidedCodeHandler {
    pub fn new() -> Self {
        Self {
            code_input: "input[autocomplete='one-time-code']".to_string(),
            verify_button: "button[data-qa='verify']".to_string(),
        }
    }

    pub fn with_selectors(
        code_input: impl Into<String>,
        verify_button: impl Into<String>,
    ) -> Self {
        Self {
            code_input: code_input.into(),
            verify_button: verify_button.into(),
        }
    }
}

impl Default for ProvidedCodeHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecondFactorHandler for ProvidedCodeHandler {
    fn name(&self) -> &str {
        "provided-code"
    }

    fn priority(&self) -> u8 {
        10
    }

    async fn can_handle(&self, session: &mut BrowserSession) -> ag_browser::Result<bool> {
        session.is_visible(&self.code_input).await
    }

    async fn apply(
        &self,
        session: &mut BrowserSession,
        credentials: &Credentials,
    ) -> ag_browser::Result<SecondFactorOutcome> {
        let Some(code) = credentials.second_factor.as_deref() else {
            return Ok(SecondFactorOutcome::Unavailable(
                "second factor required".to_string(),
            ));
        };

        info!("Submitting second-factor code");
        session.fill(&self.code_input, code).await?;
        session.click(&self.verify_button).await?;
        Ok(SecondFactorOutcome::Completed)
    }
}

/// Sort handlers into consultation order (highest priority first)
pub fn handler_chain(
    mut handlers: Vec<Arc<dyn SecondFactorHandler>>,
) -> Vec<Arc<dyn SecondFactorHandler>> {
    handlers.sort_by(|a, b| b.priority().cmp(&a.priority()));
    debug!(
        "Second-factor chain: {:?}",
        handlers.iter().map(|h| h.name()).collect::<Vec<_>>()
    );
    handlers
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPriority(&'static str, u8);

    #[async_trait]
    impl SecondFactorHandler for FixedPriority {
        fn name(&self) -> &str {
            self.0
        }

        fn priority(&self) -> u8 {
            self.1
        }

        async fn can_handle(&self, _session: &mut BrowserSession) -> ag_browser::Result<bool> {
            Ok(false)
        }

        async fn apply(
            &self,
            _session: &mut BrowserSession,
            _credentials: &Credentials,
        ) -> ag_browser::Result<SecondFactorOutcome> {
            Ok(SecondFactorOutcome::Completed)
        }
    }

    #[test]
    fn test_chain_sorted_by_priority() {
        let chain = handler_chain(vec![
            Arc::new(FixedPriority("low", 1)),
            Arc::new(FixedPriority("high", 9)),
            Arc::new(FixedPriority("mid", 5)),
        ]);
        let names: Vec<_> = chain.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }
}
