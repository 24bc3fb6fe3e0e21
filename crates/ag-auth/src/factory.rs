//! Strategy factory
//!
//! Maps flow identifiers to strategy instances. The registry is built
//! once at startup and shared immutably behind an `Arc`; concurrent
//! resolves are plain map reads.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use ag_core::{Config, Error, Result};

use crate::strategies::{FormLoginStrategy, MfaLoginStrategy, TokenLoginStrategy};
use crate::strategy::AuthStrategy;

/// Registry of supported authentication flows
pub struct StrategyFactory {
    strategies: HashMap<String, Arc<dyn AuthStrategy>>,
}

impl StrategyFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Create a factory with the default flows registered
    pub fn with_defaults(config: &Config) -> Self {
        let mut factory = Self::new();
        factory.register(Arc::new(FormLoginStrategy::new(&config.base_url)));
        factory.register(Arc::new(TokenLoginStrategy::new(
            &config.base_url,
            config.oauth.clone(),
        )));
        factory.register(Arc::new(MfaLoginStrategy::new(&config.base_url)));
        factory
    }

    /// Register a strategy under its flow identifier
    ///
    /// A strategy with the same flow id replaces the previous one.
    pub fn register(&mut self, strategy: Arc<dyn AuthStrategy>) {
        info!("Registered auth flow: {}", strategy.flow());
        self.strategies
            .insert(strategy.flow().to_string(), strategy);
    }

    /// Resolve a flow identifier to its strategy
    pub fn resolve(&self, flow_id: &str) -> Result<Arc<dyn AuthStrategy>> {
        self.strategies
            .get(flow_id)
            .cloned()
            .ok_or_else(|| Error::UnsupportedFlow(flow_id.to_string()))
    }

    /// Whether a flow is registered
    pub fn contains(&self, flow_id: &str) -> bool {
        self.strategies.contains_key(flow_id)
    }

    /// All registered flow identifiers, sorted for stable output
    pub fn flows(&self) -> Vec<String> {
        let mut flows: Vec<String> = self.strategies.keys().cloned().collect();
        flows.sort();
        flows
    }

    /// Number of registered flows
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether no flows are registered
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyFactory {
    fn default() -> Self {
        Self::new()
    }
}
