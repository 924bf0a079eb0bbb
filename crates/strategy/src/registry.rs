use std::collections::HashMap;

use tracing::debug;

use common::{Error, Result};

use crate::config::SelectorConfig;
use crate::params::{ParamError, Params};
use crate::selectors::{BreakoutVolumeSelector, MacdCrossSelector, RsiOversoldSelector};
use crate::Selector;

/// Builds a selector from its parameter mapping.
pub type SelectorFactory =
    Box<dyn Fn(&Params) -> Result<Box<dyn Selector>, ParamError> + Send + Sync>;

/// Maps implementation identifiers to selector factories.
///
/// Identifiers are validated when registered, so lookup only fails for
/// names that were never registered.
#[derive(Default)]
pub struct SelectorRegistry {
    factories: HashMap<String, SelectorFactory>,
}

impl SelectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in selector.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let factories = &mut registry.factories;
        factories.insert(RsiOversoldSelector::IDENTIFIER.into(), Box::new(build_rsi));
        factories.insert(MacdCrossSelector::IDENTIFIER.into(), Box::new(build_macd));
        factories.insert(BreakoutVolumeSelector::IDENTIFIER.into(), Box::new(build_breakout));
        registry
    }

    /// Register a factory. Empty or already-registered identifiers are rejected.
    pub fn register(&mut self, identifier: &str, factory: SelectorFactory) -> Result<()> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(Error::Config("selector identifier must not be empty".into()));
        }
        if self.factories.contains_key(identifier) {
            return Err(Error::Config(format!(
                "selector '{identifier}' is already registered"
            )));
        }
        self.factories.insert(identifier.to_string(), factory);
        Ok(())
    }

    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Turn a config entry into `(alias, selector)`.
    pub fn resolve(&self, cfg: &SelectorConfig) -> Result<(String, Box<dyn Selector>)> {
        let identifier = cfg
            .identifier
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::Config("missing implementation identifier".into()))?;

        let factory = self
            .factories
            .get(identifier)
            .ok_or_else(|| Error::StrategyNotFound {
                identifier: identifier.to_string(),
                source: format!("no selector registered as '{identifier}'").into(),
            })?;

        let selector = factory(&Params::new(&cfg.params)).map_err(|e| Error::StrategyNotFound {
            identifier: identifier.to_string(),
            source: Box::new(e),
        })?;

        let alias = cfg.alias.clone().unwrap_or_else(|| identifier.to_string());
        debug!(%alias, %identifier, "Resolved selector");
        Ok((alias, selector))
    }
}

fn build_rsi(params: &Params) -> Result<Box<dyn Selector>, ParamError> {
    Ok(Box::new(RsiOversoldSelector::from_params(params)?))
}

fn build_macd(params: &Params) -> Result<Box<dyn Selector>, ParamError> {
    Ok(Box::new(MacdCrossSelector::from_params(params)?))
}

fn build_breakout(params: &Params) -> Result<Box<dyn Selector>, ParamError> {
    Ok(Box::new(BreakoutVolumeSelector::from_params(params)?))
}
